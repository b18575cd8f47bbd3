//! Concrete operation steps built on the process framework

mod get_profile;
mod meta_keys;
mod put_profile;
mod session_creation;
mod update_profile;

pub use get_profile::GetProfileStep;
pub use meta_keys::GenerateMetaKeysStep;
pub use put_profile::PutProfileStep;
pub use session_creation::SessionCreationStep;
pub use update_profile::UpdateProfileStep;
