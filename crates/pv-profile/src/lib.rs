//! pv-profile: the user-profile document
//!
//! A [`UserProfile`] is the versioned, tree-structured description of one
//! user's synchronized files. It lives encrypted as a single DHT entry and
//! is the only state shared between a user's devices.

mod profile;

pub use profile::{FileTreeNode, NodeId, UserProfile, ROOT};
