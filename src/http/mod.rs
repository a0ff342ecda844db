//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs layers (request ID, trace span, CORS, panic catch,
//!       body deadlines, request deadline, API key gate)
//!     → {base path}/... → api handlers
//!     → {provider path} → provider handler (own key gate)
//!     → anything else → JSON 404
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
