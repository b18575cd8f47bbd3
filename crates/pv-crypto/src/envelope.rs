//! Encrypted content envelope: the wire form of anything placed in the DHT
//!
//! An envelope pairs the ciphertext with the metadata a reader needs to
//! decrypt (algorithm tag, nonce, KDF cost parameters) and the version
//! counter copied from the plaintext object — the optimistic-concurrency
//! token the store checks before accepting a replacement.
//!
//! The version is bound into the AEAD as associated data, so the stored
//! counter cannot be rewritten independently of the ciphertext.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use pv_core::{PvError, PvResult};

use crate::kdf::{KdfParams, ProfileKey};
use crate::NONCE_SIZE;

/// Algorithm identity carried in every envelope.
pub const ENVELOPE_ALGORITHM: &str = "xchacha20poly1305";

/// An encrypted, versioned wrapper around a serialized payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// AEAD algorithm identity
    pub algorithm: String,
    /// Version counter copied from the wrapped object
    pub version: u64,
    /// AEAD nonce (base64)
    pub nonce: String,
    /// Ciphertext including the authentication tag (base64)
    pub ciphertext: String,
    /// KDF cost parameters used for the key this was sealed with
    pub kdf: KdfParams,
}

impl EncryptedEnvelope {
    /// Serialize to JSON bytes for the wire.
    pub fn to_bytes(&self) -> PvResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(data: &[u8]) -> PvResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Encrypt a serializable payload into an envelope stamped with `version`.
pub fn seal<T: Serialize>(
    payload: &T,
    key: &ProfileKey,
    version: u64,
    kdf: &KdfParams,
) -> PvResult<EncryptedEnvelope> {
    let plaintext = serde_json::to_vec(payload)?;

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: &plaintext,
                aad: &version.to_le_bytes(),
            },
        )
        .map_err(|e| PvError::Crypto(format!("envelope encryption failed: {e}")))?;

    Ok(EncryptedEnvelope {
        algorithm: ENVELOPE_ALGORITHM.to_string(),
        version,
        nonce: base64_encode(&nonce_bytes),
        ciphertext: base64_encode(&ciphertext),
        kdf: kdf.clone(),
    })
}

/// Decrypt an envelope back into its payload.
///
/// A malformed envelope (unknown algorithm, bad base64, short nonce) is a
/// format error; an AEAD tag mismatch means wrong key or corrupted
/// ciphertext and surfaces as [`PvError::DecryptionFailed`].
pub fn open<T: DeserializeOwned>(envelope: &EncryptedEnvelope, key: &ProfileKey) -> PvResult<T> {
    if envelope.algorithm != ENVELOPE_ALGORITHM {
        return Err(PvError::Crypto(format!(
            "unsupported envelope algorithm: {}",
            envelope.algorithm
        )));
    }

    let nonce_bytes = base64_decode(&envelope.nonce)?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(PvError::Crypto(format!(
            "envelope nonce has wrong size: {} bytes",
            nonce_bytes.len()
        )));
    }
    let ciphertext = base64_decode(&envelope.ciphertext)?;

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(
            XNonce::from_slice(&nonce_bytes),
            Payload {
                msg: &ciphertext,
                aad: &envelope.version.to_le_bytes(),
            },
        )
        .map_err(|_| PvError::DecryptionFailed)?;

    Ok(serde_json::from_slice(&plaintext)?)
}

fn base64_encode(data: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.encode(data)
}

fn base64_decode(s: &str) -> PvResult<Vec<u8>> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD
        .decode(s)
        .map_err(|e| PvError::Crypto(format!("malformed envelope field: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        entries: Vec<u32>,
    }

    fn test_doc() -> Doc {
        Doc {
            name: "root".into(),
            entries: vec![1, 2, 3],
        }
    }

    fn test_key(byte: u8) -> ProfileKey {
        ProfileKey::from_bytes([byte; KEY_SIZE])
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = test_key(42);
        let envelope = seal(&test_doc(), &key, 7, &KdfParams::default()).unwrap();

        assert_eq!(envelope.version, 7);
        assert_eq!(envelope.algorithm, ENVELOPE_ALGORITHM);

        let opened: Doc = open(&envelope, &key).unwrap();
        assert_eq!(opened, test_doc());
    }

    #[test]
    fn test_open_wrong_key_fails() {
        let envelope = seal(&test_doc(), &test_key(1), 0, &KdfParams::default()).unwrap();
        let result: PvResult<Doc> = open(&envelope, &test_key(2));

        assert!(matches!(result, Err(PvError::DecryptionFailed)));
    }

    #[test]
    fn test_tampered_version_fails() {
        let key = test_key(42);
        let mut envelope = seal(&test_doc(), &key, 3, &KdfParams::default()).unwrap();

        // Rewriting the version without re-encrypting must break the AEAD.
        envelope.version = 4;
        let result: PvResult<Doc> = open(&envelope, &key);
        assert!(matches!(result, Err(PvError::DecryptionFailed)));
    }

    #[test]
    fn test_unknown_algorithm_is_format_error() {
        let key = test_key(42);
        let mut envelope = seal(&test_doc(), &key, 0, &KdfParams::default()).unwrap();
        envelope.algorithm = "rot13".into();

        let result: PvResult<Doc> = open(&envelope, &key);
        assert!(matches!(result, Err(PvError::Crypto(_))));
    }

    #[test]
    fn test_wire_roundtrip() {
        let key = test_key(9);
        let envelope = seal(&test_doc(), &key, 12, &KdfParams::default()).unwrap();

        let bytes = envelope.to_bytes().unwrap();
        let restored = EncryptedEnvelope::from_bytes(&bytes).unwrap();

        assert_eq!(envelope, restored);
        let opened: Doc = open(&restored, &key).unwrap();
        assert_eq!(opened, test_doc());
    }

    #[test]
    fn test_nonces_are_fresh() {
        let key = test_key(5);
        let a = seal(&test_doc(), &key, 0, &KdfParams::default()).unwrap();
        let b = seal(&test_doc(), &key, 0, &KdfParams::default()).unwrap();
        assert_ne!(a.nonce, b.nonce, "every seal must use a fresh nonce");
    }
}
