/// Server configuration
use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_limits")]
    pub limits: LimitSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Root directory holding one subdirectory per user
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitSettings {
    /// Maximum concurrent sessions admitted; further connections wait
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Deadline applied to every protocol read and write, in seconds
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from an optional file and the environment.
    ///
    /// Environment variables prefixed with `CHORUS_` override file values,
    /// e.g. `CHORUS_SERVER_PORT=9000`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let config_path = path.unwrap_or_else(|| Path::new("config.toml"));
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path.to_path_buf()));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CHORUS")
                .separator("_")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_sessions == 0 {
            return Err(ServerError::Config(
                "limits.max_sessions must be at least 1".to_string(),
            ));
        }
        if self.limits.io_timeout_secs == 0 {
            return Err(ServerError::Config(
                "limits.io_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The per-operation protocol deadline
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.io_timeout_secs)
    }

    /// The address to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            limits: default_limits(),
        }
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9999
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        data_dir: default_data_dir(),
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/users")
}

fn default_limits() -> LimitSettings {
    LimitSettings {
        max_sessions: default_max_sessions(),
        io_timeout_secs: default_io_timeout_secs(),
    }
}

fn default_max_sessions() -> usize {
    64
}

fn default_io_timeout_secs() -> u64 {
    30
}
