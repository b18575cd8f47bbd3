//! In-memory DHT with atomic version check-and-swap
//!
//! The reference backend for tests and local development. Unlike the
//! remote adapter, its conditional put really is atomic: version check and
//! replacement happen under one lock, so racing writers observe true
//! compare-and-swap semantics.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use pv_core::{PvError, PvResult};
use pv_crypto::{EncryptedEnvelope, LocationKey};

use crate::store::Dht;

#[derive(Default)]
pub struct MemoryDht {
    entries: Mutex<HashMap<(String, String), EncryptedEnvelope>>,
}

impl MemoryDht {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_key(location: &LocationKey, kind: &str) -> (String, String) {
        (location.to_hex(), kind.to_string())
    }

    /// Number of stored entries (test support).
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl Dht for MemoryDht {
    async fn get(&self, location: &LocationKey, kind: &str) -> PvResult<Option<EncryptedEnvelope>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(&Self::entry_key(location, kind)).cloned())
    }

    async fn put(
        &self,
        location: &LocationKey,
        kind: &str,
        envelope: EncryptedEnvelope,
        expected_version: Option<u64>,
    ) -> PvResult<()> {
        let mut entries = self.entries.lock().await;
        let key = Self::entry_key(location, kind);
        let stored = entries.get(&key).map(|e| e.version);

        let matches = match (expected_version, stored) {
            (None, None) => true,
            (Some(expected), Some(stored)) => expected == stored,
            _ => false,
        };
        if !matches {
            return Err(PvError::VersionConflict {
                expected: expected_version,
                stored,
            });
        }

        entries.insert(key, envelope);
        Ok(())
    }

    async fn remove(&self, location: &LocationKey, kind: &str) -> PvResult<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(&Self::entry_key(location, kind));
        Ok(())
    }
}
