//! pv-core: shared types for the peervault client
//!
//! Holds the pieces every other crate needs: the error taxonomy
//! ([`PvError`]), the TOML config schema ([`config::PvConfig`]) and the
//! user credentials type ([`credentials::UserCredentials`]).

pub mod config;
pub mod credentials;
pub mod error;

pub use config::PvConfig;
pub use credentials::UserCredentials;
pub use error::{PvError, PvResult};
