//! Configuration loading: defaults, optional TOML file, environment overrides.

use std::fs;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use super::schema::{LogFormat, ManagerConfig};
use super::validation::{validate_config, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Loads from `path` (if any) and the process environment, then validates.
pub fn load_config(path: Option<&Path>) -> Result<ManagerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => ManagerConfig::default(),
    };
    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<ManagerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Applies the recognized environment variables. `lookup` returns the raw
/// value of a variable, if set.
pub fn apply_env_overrides(
    config: &mut ManagerConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let env = Env { lookup: &lookup };

    // Server
    env.string("SERVER_HOST", &mut config.server.host);
    env.parsed("SERVER_PORT", &mut config.server.port)?;
    env.string("SERVER_BASE_PATH", &mut config.server.base_path);
    env.duration("SERVER_READ_TIMEOUT", &mut config.server.read_timeout)?;
    env.duration("SERVER_WRITE_TIMEOUT", &mut config.server.write_timeout)?;
    env.duration("SERVER_REQUEST_TIMEOUT", &mut config.server.request_timeout)?;

    // Storage
    if let Some(path) = env.get("STORAGE_FILE_PATH") {
        config.storage.file_path = path.into();
    }
    env.duration("STORAGE_SAVE_INTERVAL", &mut config.storage.save_interval)?;

    // Provider
    env.string("PROVIDER_PATH", &mut config.provider.path);
    env.boolean("PROVIDER_AUTH_ENABLED", &mut config.provider.auth.enabled)?;
    env.string("PROVIDER_AUTH_HEADER_NAME", &mut config.provider.auth.header_name);
    env.string("PROVIDER_AUTH_KEY", &mut config.provider.auth.key);

    // API auth
    env.boolean("AUTH_ENABLED", &mut config.auth.enabled)?;
    env.string("AUTH_HEADER_NAME", &mut config.auth.header_name);
    env.string("AUTH_KEY", &mut config.auth.key);

    // CORS
    env.list("CORS_ALLOWED_ORIGINS", &mut config.cors.allowed_origins);
    env.list("CORS_ALLOWED_METHODS", &mut config.cors.allowed_methods);
    env.list("CORS_ALLOWED_HEADERS", &mut config.cors.allowed_headers);
    env.boolean("CORS_ALLOW_CREDENTIALS", &mut config.cors.allow_credentials)?;
    env.duration("CORS_MAX_AGE", &mut config.cors.max_age)?;

    // Logging
    env.string("LOG_LEVEL", &mut config.logging.level);
    if let Some(raw) = env.get("LOG_FORMAT") {
        config.logging.format = raw.parse::<LogFormat>().map_err(|reason| ConfigError::Env {
            var: "LOG_FORMAT",
            reason,
        })?;
    }
    if let Some(path) = env.get("LOG_FILE_PATH") {
        config.logging.file_path = (!path.is_empty()).then(|| path.into());
    }
    env.boolean("LOG_USE_COLORS", &mut config.logging.use_colors)?;

    Ok(())
}

struct Env<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, var: &str) -> Option<String> {
        (self.lookup)(var).map(|v| v.trim().to_string())
    }

    fn string(&self, var: &'static str, target: &mut String) {
        if let Some(value) = self.get(var) {
            *target = value;
        }
    }

    fn parsed<T>(&self, var: &'static str, target: &mut T) -> Result<(), ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        if let Some(raw) = self.get(var) {
            *target = raw.parse().map_err(|e: T::Err| ConfigError::Env {
                var,
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn boolean(&self, var: &'static str, target: &mut bool) -> Result<(), ConfigError> {
        if let Some(raw) = self.get(var) {
            *target = match raw.to_ascii_lowercase().as_str() {
                "1" | "t" | "true" | "yes" | "on" => true,
                "0" | "f" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Env {
                        var,
                        reason: format!("'{raw}' is not a boolean"),
                    })
                }
            };
        }
        Ok(())
    }

    /// Humantime syntax; a bare integer is read as seconds.
    fn duration(&self, var: &'static str, target: &mut Duration) -> Result<(), ConfigError> {
        if let Some(raw) = self.get(var) {
            *target = match raw.parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => humantime::parse_duration(&raw).map_err(|e| ConfigError::Env {
                    var,
                    reason: e.to_string(),
                })?,
            };
        }
        Ok(())
    }

    fn list(&self, var: &'static str, target: &mut Vec<String>) {
        if let Some(raw) = self.get(var) {
            *target = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }
}
