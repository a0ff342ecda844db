//! Gateway provider endpoint and the projection behind it.
//!
//! # Data Flow
//! ```text
//! Gateway poll (GET <provider path>)
//!     → [provider key gate, when enabled]
//!     → handler.rs
//!     → ResourceStore::read (shared lock)
//!         → projection.rs (routers, services)
//!         → middlewares.rs (type-tag switch over raw config)
//!     → schema.rs types serialized as JSON
//! ```
//!
//! # Design Decisions
//! - Projection runs under the store's read lock, so the output never
//!   contains a reference to a resource deleted mid-projection
//! - Projection is a plain function over the store document; no I/O

pub mod handler;
pub mod middlewares;
pub mod projection;
pub mod schema;

pub use handler::provider_config;
pub use middlewares::{is_known_type, project_middleware};
pub use projection::project;
pub use schema::DynamicConfig;
