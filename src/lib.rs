//! Traefik Manager Library
//!
//! A control plane for a Traefik gateway: a CRUD API over routers, services
//! and middlewares, and an HTTP provider endpoint the gateway polls for the
//! composed dynamic configuration.

// Core
pub mod model;
pub mod provider;
pub mod store;

// Surfaces
pub mod api;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod storage;

pub use config::schema::ManagerConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
pub use store::ResourceStore;
