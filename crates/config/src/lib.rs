//! EOClient Configuration Management
//!
//! Loads client settings from a `key = value` text file. Lines starting with
//! `#` or `;` are comments and `[section]` headers are ignored, so an
//! INI-style settings file works as is. Missing or unparsable values keep
//! their defaults.

use eoclient_core::{EoError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Path used by [`ClientConfig::load_default`]
pub const DEFAULT_CONFIG_PATH: &str = "config/settings.ini";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Game server host (from "host" option)
    pub host: String,
    /// Game server port (from "port" option, default: 8078)
    pub port: u16,
    /// Directory holding `.emf` map files (from "maps_dir" option)
    pub maps_dir: PathBuf,
    /// Default log filter when `RUST_LOG` is unset (from "log_level" option)
    pub log_level: String,
    /// Client version sent during initialization
    pub version_major: u8,
    pub version_minor: u8,
    pub version_build: u8,
    /// Capacity of the inbound packet channel (from "dispatch_queue" option)
    pub dispatch_queue: usize,
    /// Compare map checksums against their content on load
    pub verify_checksums: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8078,
            maps_dir: PathBuf::from("maps"),
            log_level: "info".into(),
            version_major: 0,
            version_minor: 0,
            version_build: 28,
            dispatch_queue: 256,
            verify_checksums: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| EoError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Ok(Self::parse(&content))
    }

    /// Load `config/settings.ini`, falling back to defaults if it is missing
    pub fn load_default() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if !path.exists() {
            tracing::debug!("{} not found, using default configuration", DEFAULT_CONFIG_PATH);
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// Parse settings text
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') || line.starts_with('[') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                config.parse_option(&key.trim().to_lowercase(), value.trim());
            }
        }

        config
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        match key {
            "host" => self.host = value.into(),
            "port" => self.port = parse_or(key, value, 8078),
            "maps_dir" => self.maps_dir = PathBuf::from(value),
            "log_level" => self.log_level = value.to_lowercase(),
            "version_major" => self.version_major = parse_or(key, value, 0),
            "version_minor" => self.version_minor = parse_or(key, value, 0),
            "version_build" => self.version_build = parse_or(key, value, 28),
            "dispatch_queue" => self.dispatch_queue = parse_or(key, value, 256usize).max(1),
            "verify_checksums" => self.verify_checksums = parse_bool(value).unwrap_or(true),
            _ => tracing::debug!("Ignoring unknown config option: {}", key),
        }
    }

    /// `host:port` of the game server
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Client version as `major.minor.build`
    pub fn version(&self) -> String {
        format!("{}.{}.{}", self.version_major, self.version_minor, self.version_build)
    }

    /// Log a configuration summary
    pub fn display(&self) {
        tracing::info!("Client configuration:");
        tracing::info!("  Server: {}", self.server_address());
        tracing::info!("  Version: {}", self.version());
        tracing::info!("  Maps: {}", self.maps_dir.display());
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Dispatch queue: {}", self.dispatch_queue);
        tracing::info!("  Verify checksums: {}", self.verify_checksums);
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: &str, default: T) -> T {
    value.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid value {:?} for {}, using default", value, key);
        default
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
