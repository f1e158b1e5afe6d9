//! Offline-first sync
//!
//! Content fingerprints, the remote reconciliation contract, the delayed
//! retry schedule, and the queue engine that ties them together.

pub mod fingerprint;
pub mod queue;
pub mod remote;
pub mod retry;

pub use queue::{
    ConflictResolution, LogObserver, RemoteSnapshot, SyncObserver, SyncQueue, SyncQueueHandle,
    SyncSignal,
};
pub use remote::{HttpRemote, RemoteAck, RemoteError, SyncRemote};
