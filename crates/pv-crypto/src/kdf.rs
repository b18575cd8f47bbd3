//! Key derivation: credentials → profile key (Argon2id) and location key (BLAKE3)
//!
//! Both derivations are deterministic: the same credentials always yield the
//! same keys. Nothing derived here is ever transmitted or stored — keys are
//! re-derived on demand, which is why losing the credentials loses the
//! profile.

use argon2::{Algorithm, Argon2, Params, Version};
use secrecy::ExposeSecret;
use zeroize::Zeroize;

use pv_core::{PvError, PvResult, UserCredentials};

use crate::{KEY_SIZE, SALT_SIZE};

const SALT_CONTEXT: &str = "peervault 2024-11 profile key salt";
const LOCATION_CONTEXT: &str = "peervault 2024-11 profile location";

/// A 256-bit symmetric profile key derived from credentials via Argon2id.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct ProfileKey {
    bytes: [u8; KEY_SIZE],
}

impl ProfileKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for ProfileKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ProfileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// The fixed-size DHT location key of a profile entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationKey([u8; KEY_SIZE]);

impl LocationKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Argon2id parameters for profile-key derivation
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl From<&pv_core::config::CryptoConfig> for KdfParams {
    fn from(cfg: &pv_core::config::CryptoConfig) -> Self {
        Self {
            mem_cost_kib: cfg.argon2_mem_cost_kib,
            time_cost: cfg.argon2_time_cost,
            parallelism: cfg.argon2_parallelism,
        }
    }
}

/// Derive the 256-bit symmetric profile key from credentials using Argon2id.
///
/// The password is the KDF input; the salt is derived from the user id and
/// PIN, so all three credential parts must match to reproduce the key.
pub fn derive_profile_key(
    credentials: &UserCredentials,
    params: &KdfParams,
) -> PvResult<ProfileKey> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| PvError::Crypto(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);
    let salt = credential_salt(credentials);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(
            credentials.password().expose_secret().as_bytes(),
            &salt,
            &mut key,
        )
        .map_err(|e| PvError::Crypto(format!("Argon2id KDF failed: {e}")))?;

    Ok(ProfileKey::from_bytes(key))
}

/// Derive the profile's DHT location key.
///
/// Only the user id feeds the location: a login with wrong password or
/// PIN still finds the entry and then fails decryption, which is what
/// distinguishes "no such user" from "wrong credentials".
pub fn derive_location_key(credentials: &UserCredentials) -> LocationKey {
    let material = join_credential_parts(&[credentials.user_id().as_bytes()]);
    LocationKey(blake3::derive_key(LOCATION_CONTEXT, &material))
}

/// Deterministic 16-byte Argon2id salt from user id + PIN.
fn credential_salt(credentials: &UserCredentials) -> [u8; SALT_SIZE] {
    let material = join_credential_parts(&[
        credentials.user_id().as_bytes(),
        credentials.pin().expose_secret().as_bytes(),
    ]);
    let derived = blake3::derive_key(SALT_CONTEXT, &material);
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&derived[..SALT_SIZE]);
    salt
}

/// Length-prefix each part so ("ab","c") and ("a","bc") cannot collide.
fn join_credential_parts(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(&(part.len() as u64).to_le_bytes());
        out.extend_from_slice(part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // Fast params for testing
    fn test_params() -> KdfParams {
        KdfParams {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_profile_key_deterministic() {
        let creds = UserCredentials::new("alice", "correct-pass", "1234");

        let key1 = derive_profile_key(&creds, &test_params()).unwrap();
        let key2 = derive_profile_key(&creds, &test_params()).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes(), "KDF must be deterministic");
    }

    #[test]
    fn test_profile_key_differs_per_credential_part() {
        let base = UserCredentials::new("alice", "correct-pass", "1234");
        let other_pass = UserCredentials::new("alice", "wrong-pass", "1234");
        let other_pin = UserCredentials::new("alice", "correct-pass", "9999");
        let other_user = UserCredentials::new("bob", "correct-pass", "1234");

        let key = derive_profile_key(&base, &test_params()).unwrap();
        for creds in [&other_pass, &other_pin, &other_user] {
            let other = derive_profile_key(creds, &test_params()).unwrap();
            assert_ne!(key.as_bytes(), other.as_bytes());
        }
    }

    #[test]
    fn test_location_key_deterministic_and_distinct() {
        let alice = UserCredentials::new("alice", "correct-pass", "1234");
        let bob = UserCredentials::new("bob", "correct-pass", "1234");

        assert_eq!(derive_location_key(&alice), derive_location_key(&alice));
        assert_ne!(derive_location_key(&alice), derive_location_key(&bob));
    }

    #[test]
    fn test_location_key_ignores_password_and_pin() {
        // Wrong PIN must still locate the entry (and then fail to decrypt).
        let right = UserCredentials::new("alice", "correct-pass", "1234");
        let wrong_pin = UserCredentials::new("alice", "correct-pass", "9999");

        assert_eq!(derive_location_key(&right), derive_location_key(&wrong_pin));
    }

    #[test]
    fn test_location_key_hex() {
        let creds = UserCredentials::new("alice", "pw", "0000");
        let hex = derive_location_key(&creds).to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_join_parts_is_unambiguous() {
        let a = join_credential_parts(&[b"ab", b"c"]);
        let b = join_credential_parts(&[b"a", b"bc"]);
        assert_ne!(a, b);
    }
}
