//! Resource store with referential integrity.
//!
//! # Data Flow
//! ```text
//! API handler
//!     → ResourceStore::{create, update, delete}   (exclusive lock)
//!         → Resource::resolve    (service + middleware refs must exist)
//!         → Resource::referrers  (in-use check before delete)
//!         → ReferenceIndex       (routers by service / by middleware)
//!     → SaveSignal::notify                         (after unlock)
//!
//! Provider / persister
//!     → ResourceStore::{read, document}            (shared lock)
//! ```
//!
//! # Design Decisions
//! - One lock over the whole aggregate; no per-map locking
//! - Operations are generic over [`Resource`]; per-kind rules live in the
//!   trait impls
//! - Reads return clones so callers never hold the lock

mod error;
mod resource;
mod state;
#[allow(clippy::module_inception)]
mod store;

pub use error::{StoreError, StoreResult};
pub use resource::Resource;
pub use state::{ReferenceIndex, StoreDocument, StoreState};
pub use store::ResourceStore;
