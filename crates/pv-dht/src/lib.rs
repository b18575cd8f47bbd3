//! pv-dht: the distributed hash table seen from the client
//!
//! The network transport is an external collaborator; this crate fixes its
//! interface ([`Dht`]) and ships two implementations: [`MemoryDht`] (atomic
//! check-and-swap, used by tests and local development) and [`OpendalDht`]
//! (any S3-compatible remote store).

mod memory;
mod remote;
mod store;

pub use memory::MemoryDht;
pub use remote::{build_operator, OpendalDht};
pub use store::Dht;
