//! Published device data.

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotStore};
