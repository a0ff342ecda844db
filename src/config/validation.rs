//! Configuration validation.
//!
//! Semantic checks that serde cannot express. All problems are collected
//! and returned together.

use std::fmt;

use axum::http::{HeaderName, Method};

use super::schema::{AuthConfig, ManagerConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// One semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Setting the problem is about, named by its environment variable.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ManagerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_gate(&config.auth, "AUTH_KEY", "AUTH_HEADER_NAME", &mut errors);
    check_gate(
        &config.provider.auth,
        "PROVIDER_AUTH_KEY",
        "PROVIDER_AUTH_HEADER_NAME",
        &mut errors,
    );

    let base = &config.server.base_path;
    if !base.starts_with('/') {
        errors.push(ValidationError::new(
            "SERVER_BASE_PATH",
            format!("must start with '/' (got '{base}')"),
        ));
    }

    let provider = &config.provider.path;
    if !provider.starts_with('/') || provider.len() < 2 {
        errors.push(ValidationError::new(
            "PROVIDER_PATH",
            format!("must be a non-root path starting with '/' (got '{provider}')"),
        ));
    } else {
        let prefix = config.server.api_prefix();
        let shadowed = ["health", "routers", "services", "middlewares"]
            .iter()
            .any(|route| provider.starts_with(&format!("{prefix}/{route}")));
        if shadowed {
            errors.push(ValidationError::new(
                "PROVIDER_PATH",
                format!("'{provider}' collides with an API route under '{base}'"),
            ));
        }
    }

    if config.server.request_timeout.is_zero() {
        errors.push(ValidationError::new(
            "SERVER_REQUEST_TIMEOUT",
            "must be greater than 0",
        ));
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "LOG_LEVEL",
            format!(
                "unknown level '{}' (expected one of {})",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    for method in &config.cors.allowed_methods {
        if method.parse::<Method>().is_err() {
            errors.push(ValidationError::new(
                "CORS_ALLOWED_METHODS",
                format!("invalid method '{method}'"),
            ));
        }
    }
    for header in &config.cors.allowed_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "CORS_ALLOWED_HEADERS",
                format!("invalid header name '{header}'"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_gate(
    auth: &AuthConfig,
    key_var: &'static str,
    header_var: &'static str,
    errors: &mut Vec<ValidationError>,
) {
    if !auth.enabled {
        return;
    }
    if auth.key.is_empty() {
        errors.push(ValidationError::new(
            key_var,
            "must be set when authentication is enabled",
        ));
    }
    if HeaderName::from_bytes(auth.header_name.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            header_var,
            format!("invalid header name '{}'", auth.header_name),
        ));
    }
}
