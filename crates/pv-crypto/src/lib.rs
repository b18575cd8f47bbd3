//! pv-crypto: client-side encryption for peervault profiles
//!
//! Key derivation:
//! ```text
//! UserCredentials (user id, password, PIN — never stored)
//!   ├── Profile Key  (256-bit, Argon2id over password; salt = BLAKE3(user id, PIN))
//!   │     └── Envelope AEAD: XChaCha20-Poly1305 (AAD = envelope version)
//!   └── Location Key (BLAKE3 derive_key over the user id)
//! ```
//!
//! Node identities are independent Ed25519 key pairs; the public half is a
//! node's DHT lookup key. Content integrity uses BLAKE3.

pub mod envelope;
pub mod hash;
pub mod kdf;
pub mod keys;

pub use envelope::{open, seal, EncryptedEnvelope};
pub use hash::{hash_bytes, hash_file, ContentHash};
pub use kdf::{derive_location_key, derive_profile_key, KdfParams, LocationKey, ProfileKey};
pub use keys::NodeKeyPair;

/// Size of a profile key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a KDF salt
pub const SALT_SIZE: usize = 16;
