//! API Configuration Module
//!
//! Handles configuration loading for the funding ledger server.
//! Supports configuration files and `FUNDING_LEDGER_*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::{info, warn};

/// Environment variable prefix for every setting
pub const ENV_PREFIX: &str = "FUNDING_LEDGER";

/// Server configuration for the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server bind address and port
    pub bind_address: SocketAddr,

    /// Server environment (development, staging, production)
    pub environment: String,

    /// CORS allowed origins; empty allows any origin
    pub cors_origins: Vec<String>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum accepted upload or form body in bytes
    pub max_upload_bytes: usize,

    /// Expose the Prometheus endpoint
    pub enable_metrics: bool,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8787),
            environment: "development".to_string(),
            cors_origins: Vec::new(),
            request_timeout_secs: 30,
            max_upload_bytes: 10 * 1024 * 1024, // 10MB
            enable_metrics: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration, reading `path` instead of the default files when given
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = match path {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder
                .add_source(File::with_name("funding-ledger.toml").required(false))
                .add_source(File::with_name("config/funding-ledger.toml").required(false)),
        };

        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("bind_address", "0.0.0.0:8787")?
            .set_default("environment", "development")?
            .set_default("request_timeout_secs", 30)?
            .set_default("max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("enable_metrics", true)?;

        // Parse CORS origins from a comma separated environment variable
        if let Ok(cors_origins_str) = env::var(format!("{ENV_PREFIX}_CORS_ORIGINS")) {
            let cors_origins: Vec<String> = cors_origins_str
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            builder = builder.set_override("cors_origins", cors_origins)?;
        }

        let config = builder.build()?;
        let api_config: ApiConfig = config.try_deserialize()?;

        api_config.validate()?;

        Ok(api_config)
    }

    /// Human-readable summary of the effective settings
    pub fn summary(&self) -> Vec<String> {
        vec![
            format!("Environment: {}", self.environment),
            format!("Bind Address: {}", self.bind_address),
            format!("CORS Origins: {:?}", self.cors_origins),
            format!("Max Upload: {} bytes", self.max_upload_bytes),
            format!("Request Timeout: {}s", self.request_timeout_secs),
            format!("Metrics Enabled: {}", self.enable_metrics),
        ]
    }

    /// Logs the summary; call once a subscriber is installed
    pub fn log_summary(&self) {
        info!("API Configuration loaded:");
        for line in self.summary() {
            info!("  {}", line);
        }

        if self.cors_origins.is_empty() && self.is_production() {
            warn!("CORS origins list is empty - any origin will be allowed");
        }
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Message(
                "Max upload size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns true if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable structured logging (JSON format)
    pub structured: bool,

    /// Log to a daily rolling file in addition to stdout
    pub log_to_file: bool,

    /// Directory for rolling log files
    pub log_directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            structured: false,
            log_to_file: false,
            log_directory: "logs".to_string(),
        }
    }
}
