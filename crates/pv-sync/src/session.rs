//! The active login session
//!
//! Created by the login process's session-creation step and visible to
//! every subsequent operation on this client; cleared when that step is
//! rolled back or the user logs out.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use pv_crypto::NodeKeyPair;

use crate::profile_manager::UserProfileManager;

/// Everything an operation needs once a user is logged in.
pub struct Session {
    user_id: String,
    profile_manager: Arc<UserProfileManager>,
    /// Write-protection keys consumed from the profile at login.
    protection_keys: NodeKeyPair,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        profile_manager: Arc<UserProfileManager>,
        protection_keys: NodeKeyPair,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            profile_manager,
            protection_keys,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn profile_manager(&self) -> &Arc<UserProfileManager> {
        &self.profile_manager
    }

    pub fn protection_keys(&self) -> &NodeKeyPair {
        &self.protection_keys
    }
}

/// Holder of the (at most one) active session per client.
#[derive(Default)]
pub struct SessionManager {
    current: Mutex<Option<Arc<Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, session: Session) {
        info!(user = session.user_id(), "session installed");
        *self.current.lock().await = Some(Arc::new(session));
    }

    pub async fn clear(&self) {
        *self.current.lock().await = None;
    }

    pub async fn current(&self) -> Option<Arc<Session>> {
        self.current.lock().await.clone()
    }
}
