pub mod index;
pub mod snapshot;
pub mod store;
pub mod wal;

pub use store::{
    Snapshot, SnapshotLink, SnapshotMeta, SnapshotNode, StoreError, StoreStats, TemporalGraphStore,
};
