//! pv-sync: the profile synchronization engine and its operations
//!
//! The [`UserProfileManager`] owns the get-decrypt / mutate / encrypt-put
//! protocol for one user's profile entry in the DHT, under optimistic
//! concurrency. Operations (register, login, upload) are assembled from
//! [`pv_process`] steps in [`ops`]; each runs as an atomic-looking unit —
//! any failure rolls the already-applied steps back before the caller
//! sees it.

pub mod contexts;
pub mod fs;
pub mod ops;
pub mod profile_manager;
pub mod registry;
pub mod session;
pub mod steps;

pub use profile_manager::{UserProfileManager, USER_PROFILE_KIND};
pub use registry::ProfileManagerRegistry;
pub use session::{Session, SessionManager};
