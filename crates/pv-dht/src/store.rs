//! The DHT collaborator interface

use async_trait::async_trait;

use pv_core::PvResult;
use pv_crypto::{EncryptedEnvelope, LocationKey};

/// Client view of the DHT: independent get/put/remove on (location, kind)
/// addressed entries. No multi-key transactions exist; the only
/// concurrency primitive is the version-conditional `put`.
#[async_trait]
pub trait Dht: Send + Sync {
    /// Fetch an entry, `None` if absent.
    async fn get(&self, location: &LocationKey, kind: &str) -> PvResult<Option<EncryptedEnvelope>>;

    /// Conditionally replace an entry.
    ///
    /// The entry is only written if the currently stored envelope's version
    /// equals `expected_version` (`None` = the entry must be absent).
    /// Otherwise the put fails with [`pv_core::PvError::VersionConflict`]
    /// and the caller must redo its whole get→mutate→put cycle.
    async fn put(
        &self,
        location: &LocationKey,
        kind: &str,
        envelope: EncryptedEnvelope,
        expected_version: Option<u64>,
    ) -> PvResult<()>;

    /// Remove an entry. Removing an absent entry is not an error.
    async fn remove(&self, location: &LocationKey, kind: &str) -> PvResult<()>;
}
