//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields)
//!     → logging.rs subscriber (JSON or text, stdout or file)
//!
//! HTTP requests additionally carry:
//!     → x-request-id (generated or propagated by the server layers)
//!     → a request span wrapping every event of that request
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every log line of a request via its span

pub mod logging;

pub use logging::{init_logging, LoggingError};
