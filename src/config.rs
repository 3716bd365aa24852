//! Configuration management for Wanas
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files. Register address overrides are kept in the
//! same file under `registers`.

use crate::error::{Result, WanasError};
use crate::registers::RegisterMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Device connection parameters
    pub connection: ConnectionConfig,

    /// Seconds between periodic poll cycles
    pub scan_interval_secs: u64,

    /// Largest address gap merged into a single read block
    pub max_gap: u16,

    /// Register address and display name overrides, applied over the catalog
    pub registers: RegisterMap,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,
}

/// Framing used to talk to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Modbus TCP (MBAP header)
    Tcp,
    /// Modbus over UDP datagrams (MBAP header)
    Udp,
    /// RTU frames tunnelled through a TCP stream
    RtuOverTcp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::RtuOverTcp => "rtu_over_tcp",
        };
        f.write_str(s)
    }
}

/// Device connection parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Host name or IP address of the device or gateway
    pub host: String,

    /// Port (typically 502)
    pub port: u16,

    /// Modbus unit identifier
    pub slave_id: u8,

    /// Framing variant
    pub protocol: Protocol,

    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Per-request timeout in milliseconds
    pub operation_timeout_ms: u64,
}

impl ConnectionConfig {
    /// Stable identifier of the configured device
    pub fn device_id(&self) -> String {
        format!("{}:{}:{}", self.host, self.port, self.slave_id)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level
    pub console_level: Option<String>,

    /// Optional file-specific level
    pub file_level: Option<String>,

    /// Log directory or file path; console only when unset
    pub file: Option<String>,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WebConfig {
    /// Serve the HTTP API
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "wanas_config.yaml",
            "/data/wanas_config.yaml",
            "/etc/wanas/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.connection.host.trim().is_empty() {
            return Err(WanasError::validation(
                "connection.host",
                "Host cannot be empty",
            ));
        }

        if self.connection.port == 0 {
            return Err(WanasError::validation(
                "connection.port",
                "Port must be greater than 0",
            ));
        }

        if self.connection.connect_timeout_ms == 0 || self.connection.operation_timeout_ms == 0 {
            return Err(WanasError::validation(
                "connection",
                "Timeouts must be greater than 0",
            ));
        }

        if self.scan_interval_secs == 0 {
            return Err(WanasError::validation(
                "scan_interval_secs",
                "Must be greater than 0",
            ));
        }

        crate::logging::parse_log_level(&self.logging.level)?;

        self.registers.validate()?;

        Ok(())
    }
}
