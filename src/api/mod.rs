//! Resource API.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → auth.rs (API-wide key gate, prefix exclusions)
//!     → handlers.rs (generic over Router / Service / Middleware)
//!         → body.rs (decode, required fields, id rules, reference normalization)
//!         → store (integrity checks)
//!     → error.rs (store errors → status + JSON body)
//! ```
//!
//! # Design Decisions
//! - One set of generic handlers; per-kind rules live in [`ApiResource`]
//! - Every error body is `{"error": ...}`; in-use conflicts add `used_by`

pub mod auth;
pub mod body;
pub mod error;
pub mod handlers;
pub mod health;

use axum::{routing::get, Router};

pub use auth::{require_key, KeyGate};
pub use body::ApiResource;
pub use error::ApiError;

use crate::http::server::AppState;
use crate::model::{Middleware, Router as RouterResource, Service};

/// Routes relative to the API base path.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(resource_routes::<RouterResource>("/routers"))
        .merge(resource_routes::<Service>("/services"))
        .merge(resource_routes::<Middleware>("/middlewares"))
}

fn resource_routes<R: ApiResource>(collection: &str) -> Router<AppState> {
    Router::new()
        .route(
            collection,
            get(handlers::list::<R>).post(handlers::create::<R>),
        )
        .route(
            &format!("{collection}/{{id}}"),
            get(handlers::get::<R>)
                .put(handlers::update::<R>)
                .delete(handlers::delete::<R>),
        )
}
