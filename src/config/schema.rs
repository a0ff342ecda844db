//! Configuration schema definitions.
//!
//! Every section and field has a default, so an empty TOML file (or none at
//! all) yields a runnable configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the manager.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ManagerConfig {
    /// Listener, API prefix and HTTP deadlines.
    pub server: ServerConfig,

    /// Snapshot file and periodic save.
    pub storage: StorageConfig,

    /// Gateway provider endpoint.
    pub provider: ProviderConfig,

    /// API-wide shared-secret gate.
    pub auth: AuthConfig,

    pub cors: CorsConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// Prefix for every API route (e.g. `/api/v1`).
    pub base_path: String,

    /// Deadline for reading a request body.
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,

    /// Deadline for writing a response body.
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// Whole-request deadline; exceeded requests get 504.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base path without a trailing slash; empty when mounted at the root.
    pub fn api_prefix(&self) -> &str {
        self.base_path.trim_end_matches('/')
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            base_path: "/api/v1".to_string(),
            read_timeout: Duration::from_secs(15),
            write_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Snapshot file; its parent directory is created on startup.
    pub file_path: PathBuf,

    /// Periodic save interval. Zero disables periodic saves.
    #[serde(with = "humantime_serde")]
    pub save_interval: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file_path: std::env::temp_dir().join("traefik-manager.json"),
            save_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub path: String,

    /// Gate specific to the provider endpoint, independent of `auth`.
    pub auth: AuthConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            path: "/traefik/provider".to_string(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub header_name: String,
    pub key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            header_name: "X-API-Key".to_string(),
            key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// `*` allows any origin.
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allowed_headers: ["Content-Type", "Authorization"].map(String::from).to_vec(),
            allow_credentials: false,
            max_age: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{other}' (expected json or text)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error. `RUST_LOG` refines it further.
    pub level: String,

    pub format: LogFormat,

    /// Append to this file instead of stdout.
    pub file_path: Option<PathBuf>,

    /// ANSI colors for the text format.
    pub use_colors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            file_path: None,
            use_colors: true,
        }
    }
}
