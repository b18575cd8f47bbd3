//! Node identity key pairs
//!
//! Every node of the synchronized file tree carries its own Ed25519 key
//! pair; the public half doubles as the node's DHT lookup key for metadata
//! stored outside the profile. These keys are independent of the
//! password-derived profile key — they address, they do not conceal.

use ed25519_dalek::{SigningKey, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An Ed25519 key pair identifying one file-tree node.
#[derive(Clone)]
pub struct NodeKeyPair {
    signing: SigningKey,
}

impl NodeKeyPair {
    /// Generate a fresh random key pair.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_secret_bytes(bytes: [u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&bytes),
        }
    }

    /// The node's public identity / DHT lookup key.
    pub fn public(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    pub fn public_hex(&self) -> String {
        self.public()
            .as_bytes()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

impl PartialEq for NodeKeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.signing.to_bytes() == other.signing.to_bytes()
    }
}

impl Eq for NodeKeyPair {}

impl std::fmt::Debug for NodeKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeKeyPair")
            .field("public", &self.public_hex())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

// The pair travels inside the encrypted profile document, so the secret
// half is serialized (the envelope is what protects it).
impl Serialize for NodeKeyPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.signing.to_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeKeyPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = <[u8; SECRET_KEY_LENGTH]>::deserialize(deserializer)?;
        Ok(Self::from_secret_bytes(bytes))
    }
}
