//! # Configuration
//!
//! Settings shared by `pack109-server` and `pack109-client`: addresses, the
//! snapshot path, frame limits and the obfuscation key.
//!
//! ## Precedence
//! Built-in defaults, then a TOML file (`from_file()`), then `PACK109_*`
//! environment variables (`apply_env()`), then command-line flags.
//!
//! ## Limits
//! - Files are capped at 65 535 bytes
//! - Frames are capped at 70 000 bytes, leaving room for envelope overhead

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

/// Port used when an address omits one
pub const DEFAULT_PORT: u16 = 8081;

/// Default XOR key for payload obfuscation
pub const OBFUSCATION_KEY: u8 = 42;

/// Max allowed frame payload size
pub const MAX_FRAME_SIZE: usize = 70_000;

/// Max allowed file content size
pub const MAX_FILE_SIZE: usize = 65_535;

/// Max filename length, bounded by the one-byte string prefix
pub const MAX_FILENAME_LEN: usize = 255;

/// Complete configuration for either binary
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NetworkConfig {
    /// Listener and persistence settings for `pack109-server`
    #[serde(default)]
    pub server: ServerConfig,

    /// Target and download settings for `pack109-client`
    #[serde(default)]
    pub client: ClientConfig,

    /// Settings both ends must agree on
    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NetworkConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProtocolError::ConfigError(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ProtocolError::ConfigError(format!("Invalid TOML: {e}")))
    }

    /// Defaults with `PACK109_*` overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `PACK109_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var("PACK109_SERVER_ADDRESS") {
            self.server.address = with_default_port(&addr);
        }

        if let Ok(addr) = std::env::var("PACK109_CLIENT_ADDRESS") {
            self.client.address = with_default_port(&addr);
        }

        if let Ok(path) = std::env::var("PACK109_PERSIST_PATH") {
            self.server.persist_path = Some(PathBuf::from(path));
        }

        if let Ok(key) = std::env::var("PACK109_OBFUSCATION_KEY") {
            self.transport.obfuscation_key = key.parse::<u8>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid PACK109_OBFUSCATION_KEY '{key}': {e}"))
            })?;
        }

        if let Ok(size) = std::env::var("PACK109_MAX_FRAME_SIZE") {
            self.transport.max_frame_size = size.parse::<usize>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid PACK109_MAX_FRAME_SIZE '{size}': {e}"))
            })?;
        }

        Ok(())
    }

    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// The default configuration rendered as TOML.
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Cannot render config: {e}")))?;
        std::fs::write(path, text).map_err(|e| {
            ProtocolError::ConfigError(format!("Cannot write {}: {e}", path.display()))
        })
    }

    /// Every problem found, one message each. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.client.validate());
        errors.extend(self.transport.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Like [`validate`](Self::validate), folded into a single error.
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Append [`DEFAULT_PORT`] to an address given as a bare host.
///
/// `"localhost"` becomes `"localhost:8081"`; `"10.0.0.1:9000"` is unchanged.
pub fn with_default_port(addr: &str) -> String {
    // A bracketed IPv6 literal carries its own colons.
    let has_port = match addr.rfind(']') {
        Some(close) => addr[close..].contains(':'),
        None => addr.contains(':'),
    };
    if has_port {
        addr.to_string()
    } else {
        format!("{addr}:{DEFAULT_PORT}")
    }
}

fn validate_address(kind: &str, address: &str) -> Option<String> {
    if address.is_empty() {
        return Some(format!("{kind} address cannot be empty"));
    }
    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => None,
        _ => Some(format!(
            "Invalid {} address format: '{}' (expected format: 'host:port')",
            kind.to_lowercase(),
            address
        )),
    }
}

/// Listener and persistence settings for `pack109-server`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server listen address (e.g., "127.0.0.1:8081")
    pub address: String,

    /// Snapshot file for the file store; `None` keeps files in memory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: format!("127.0.0.1:{DEFAULT_PORT}"),
            persist_path: None,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        errors.extend(validate_address("Server", &self.address));

        if let Some(path) = &self.persist_path {
            if path.as_os_str().is_empty() {
                errors.push("Persistence path cannot be empty".to_string());
            } else if path.is_dir() {
                errors.push(format!(
                    "Persistence path is a directory: {}",
                    path.display()
                ));
            } else if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    errors.push(format!(
                        "Persistence directory does not exist: {}",
                        parent.display()
                    ));
                }
            }
        }

        errors
    }
}

/// Target and download settings for `pack109-client`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Target server address
    pub address: String,

    /// Directory where requested files are written
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: format!("127.0.0.1:{DEFAULT_PORT}"),
            download_dir: default_download_dir(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        errors.extend(validate_address("Client", &self.address));

        if self.download_dir.as_os_str().is_empty() {
            errors.push("Download directory cannot be empty".to_string());
        }

        errors
    }
}

/// Settings both ends must agree on
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// XOR key applied to every frame payload
    pub obfuscation_key: u8,

    /// Maximum accepted frame payload in bytes
    pub max_frame_size: usize,

    /// Maximum file content a client will send
    pub max_file_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            obfuscation_key: OBFUSCATION_KEY,
            max_frame_size: MAX_FRAME_SIZE,
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

impl TransportConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_frame_size == 0 {
            errors.push("Max frame size cannot be 0".to_string());
        } else if self.max_frame_size > u32::MAX as usize {
            errors.push(format!(
                "Max frame size too large: {} bytes (limit: {})",
                self.max_frame_size,
                u32::MAX
            ));
        }

        // File message overhead: discriminator, tagged filename, 4-byte data length.
        let overhead = 1 + 2 + MAX_FILENAME_LEN + 4;
        if self.max_file_size + overhead > self.max_frame_size {
            errors.push(format!(
                "Max frame size {} cannot carry a {} byte file (needs {})",
                self.max_frame_size,
                self.max_file_size,
                self.max_file_size + overhead
            ));
        }

        errors
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Recorded once at startup
    pub app_name: String,

    /// Used when `RUST_LOG` is unset
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Emit one JSON object per event
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("pack109"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

// `tracing::Level` has no serde support; store it as a lowercase name.
mod log_level_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use tracing::Level;

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.as_str().to_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse::<Level>()
            .map_err(|_| D::Error::custom(format!("unknown log level '{name}'")))
    }
}
