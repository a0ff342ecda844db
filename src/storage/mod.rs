//! Snapshot persistence.
//!
//! # Data Flow
//! ```text
//! Startup:   snapshot file → snapshot::load → ResourceStore::from_document
//! Runtime:   store write → SaveSignal (depth-1, coalescing) ┐
//!            periodic tick (optional)                       ├→ SavePersister → snapshot::write
//! Shutdown:  broadcast signal ──────────────────────────────┘   (final save)
//! ```
//!
//! # Design Decisions
//! - One JSON document for the whole store, pretty-printed
//! - Writes go to `<path>.tmp` then rename, so readers never see a torn file
//! - Save failures are logged and retried on the next signal or tick

mod persister;
mod snapshot;

pub use persister::{load_store, save_channel, SavePersister, SaveRequests, SaveSignal};
pub use snapshot::{ensure_parent, load, write, SnapshotError};
