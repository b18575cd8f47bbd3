//! Operation assembly: wiring steps into runnable processes
//!
//! Each builder returns the process plus its typed context; the caller
//! drives it with [`Process::run`]. Conflicts surfacing from `register`
//! mean the user id is already taken.

use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use pv_process::Process;
use pv_profile::UserProfile;

use crate::contexts::{LoginContext, RegisterContext, UploadContext};
use crate::profile_manager::UserProfileManager;
use crate::session::SessionManager;
use crate::steps::{GenerateMetaKeysStep, GetProfileStep, PutProfileStep};

/// Register a new user: put a fresh, empty profile into the DHT.
pub fn register_process(
    manager: Arc<UserProfileManager>,
) -> (Process<RegisterContext>, RegisterContext) {
    let process = Process::new("register", PutProfileStep::default());
    let ctx = RegisterContext {
        process_id: process.id(),
        profile: UserProfile::new(manager.user_id()),
        manager,
    };
    (process, ctx)
}

/// Log a user in: fetch and decrypt the profile, then install the
/// session. The chain is dynamic — session creation is appended by the
/// get-profile step once the profile is in hand.
pub fn login_process(
    manager: Arc<UserProfileManager>,
    sessions: Arc<SessionManager>,
) -> (Process<LoginContext>, LoginContext) {
    let process = Process::new("login", GetProfileStep::default());
    let ctx = LoginContext {
        process_id: process.id(),
        manager,
        sessions,
        profile: None,
        pending_protection_keys: None,
    };
    (process, ctx)
}

/// Announce a new file in the profile tree: generate the node's identity
/// keys, then commit the tree mutation. Pass the same `cancel` token to
/// [`Process::run`]; the update step also checks it right before the
/// irreversible commit.
pub fn upload_process(
    manager: Arc<UserProfileManager>,
    sync_root: PathBuf,
    file_path: PathBuf,
    cancel: CancellationToken,
) -> (Process<UploadContext>, UploadContext) {
    let process = Process::new("upload", GenerateMetaKeysStep::default());
    let ctx = UploadContext {
        process_id: process.id(),
        manager,
        cancel,
        sync_root,
        file_path,
        meta_keys: None,
    };
    (process, ctx)
}
