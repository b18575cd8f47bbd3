//! Typed per-operation contexts
//!
//! Each operation gets its own context struct: explicit fields a step
//! reads and writes, owned by the running process and dropped with it.
//! Optional fields are the hand-off points between steps (a later step
//! validates presence at its boundary).

use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use pv_crypto::NodeKeyPair;
use pv_process::ProcessId;
use pv_profile::UserProfile;

use crate::profile_manager::UserProfileManager;
use crate::session::SessionManager;

/// Login: fetch the profile, then install the session.
pub struct LoginContext {
    pub process_id: ProcessId,
    pub manager: Arc<UserProfileManager>,
    pub sessions: Arc<SessionManager>,
    /// Set by the get-profile step.
    pub profile: Option<UserProfile>,
    /// Protection keys pending installation, consumed by session creation.
    pub pending_protection_keys: Option<NodeKeyPair>,
}

/// Registration: put a fresh profile into the DHT.
pub struct RegisterContext {
    pub process_id: ProcessId,
    pub manager: Arc<UserProfileManager>,
    pub profile: UserProfile,
}

/// Upload: announce a new file in the profile tree.
pub struct UploadContext {
    pub process_id: ProcessId,
    pub manager: Arc<UserProfileManager>,
    pub cancel: CancellationToken,
    /// Local sync root the file lives under.
    pub sync_root: PathBuf,
    /// Absolute path of the file being uploaded.
    pub file_path: PathBuf,
    /// Key pair for the new node, produced by the key-generation step.
    pub meta_keys: Option<NodeKeyPair>,
}
