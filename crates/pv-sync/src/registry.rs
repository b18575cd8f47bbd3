//! One live profile manager per profile
//!
//! The exclusive-writer slot inside [`UserProfileManager`] only works if
//! every local operation on a profile goes through the same manager
//! instance. The registry enforces that: it hands out `Arc`s and never
//! creates a second live manager for the same user id.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::debug;

use pv_core::{PvConfig, PvResult, UserCredentials};
use pv_crypto::KdfParams;
use pv_dht::Dht;

use crate::profile_manager::UserProfileManager;

pub struct ProfileManagerRegistry {
    dht: Arc<dyn Dht>,
    kdf: KdfParams,
    max_commit_retries: u32,
    managers: Mutex<HashMap<String, Weak<UserProfileManager>>>,
}

impl ProfileManagerRegistry {
    pub fn new(dht: Arc<dyn Dht>, config: &PvConfig) -> Self {
        Self {
            dht,
            kdf: KdfParams::from(&config.crypto),
            max_commit_retries: config.sync.max_commit_retries,
            managers: Mutex::new(HashMap::new()),
        }
    }

    /// Get the live manager for these credentials, creating it if none
    /// exists. Two concurrent callers for the same user id receive the
    /// same instance.
    pub async fn manager_for(
        &self,
        credentials: &UserCredentials,
    ) -> PvResult<Arc<UserProfileManager>> {
        let mut managers = self.managers.lock().await;

        if let Some(existing) = managers
            .get(credentials.user_id())
            .and_then(Weak::upgrade)
        {
            return Ok(existing);
        }

        let manager = Arc::new(UserProfileManager::new(
            self.dht.clone(),
            credentials,
            self.kdf.clone(),
            self.max_commit_retries,
        )?);
        managers.insert(
            credentials.user_id().to_string(),
            Arc::downgrade(&manager),
        );
        managers.retain(|_, weak| weak.strong_count() > 0);
        debug!(user = credentials.user_id(), "created profile manager");
        Ok(manager)
    }
}
