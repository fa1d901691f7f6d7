//! Configuration loading
//!
//! TOML bootstrap file plus command-line/environment overrides. All fields
//! have built-in defaults, so the service starts with no configuration file
//! at all (two listeners on the compiled-in ports, store under `data/`).
//!
//! Settings priority:
//! 1. Command-line arguments / environment variables
//! 2. TOML configuration file
//! 3. Built-in defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port of the public survey intake listener.
    #[serde(default = "default_survey_port")]
    pub survey_port: u16,

    /// Port of the authenticated statistics listener.
    #[serde(default = "default_stats_port")]
    pub stats_port: u16,

    /// Path of the response store file.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Optional questionnaire schema file; the built-in questionnaire is
    /// used when absent.
    #[serde(default)]
    pub schema_file: Option<PathBuf>,

    /// Honor `X-Forwarded-For` / `X-Real-IP` when resolving client origins.
    /// Only sound behind a trusted reverse proxy; the headers are spoofable.
    #[serde(default = "default_trust_proxy")]
    pub trust_proxy: bool,

    /// Dashboard credentials.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// HTTP Basic credentials for the statistics listener.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_username")]
    pub username: String,

    /// An empty password disables the authentication gate entirely; set one
    /// before exposing the statistics listener.
    #[serde(default)]
    pub password: String,
}

impl DashboardConfig {
    pub fn auth_enabled(&self) -> bool {
        !self.password.is_empty()
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            survey_port: default_survey_port(),
            stats_port: default_stats_port(),
            data_file: default_data_file(),
            schema_file: None,
            trust_proxy: default_trust_proxy(),
            dashboard: DashboardConfig::default(),
        }
    }
}

fn default_survey_port() -> u16 {
    1144
}

fn default_stats_port() -> u16 {
    1145
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data/responses.json")
}

fn default_trust_proxy() -> bool {
    true
}

fn default_username() -> String {
    "admin".to_string()
}

/// Command-line configuration overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub survey_port: Option<u16>,
    pub stats_port: Option<u16>,
    pub data_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration, starting from defaults, then the TOML file when
    /// given, then CLI overrides.
    pub fn load(toml_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match toml_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!(
                        "Failed to read config file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let config: Config = toml::from_str(&raw)
                    .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            None => Config::default(),
        };

        if let Some(port) = overrides.survey_port {
            config.survey_port = port;
        }
        if let Some(port) = overrides.stats_port {
            config.stats_port = port;
        }
        if let Some(path) = overrides.data_file {
            config.data_file = path;
        }

        if config.survey_port == config.stats_port {
            return Err(Error::Config(format!(
                "survey_port and stats_port must differ (both {})",
                config.survey_port
            )));
        }

        Ok(config)
    }
}
