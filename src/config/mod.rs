//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (--config / MANAGER_CONFIG)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks, all errors collected)
//!     → ManagerConfig (immutable for the life of the process)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow running with no file at all
//! - Environment variables win over the file
//! - An unparsable environment value is fatal and names the variable

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    AuthConfig, CorsConfig, LogFormat, LoggingConfig, ManagerConfig, ProviderConfig,
    ServerConfig, StorageConfig,
};
pub use validation::{validate_config, ValidationError};
