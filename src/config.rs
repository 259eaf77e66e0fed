//! Configuration types for sv-downloader

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Remote platform connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform, without trailing path (e.g. "https://platform.openquake.org")
    pub host: String,

    /// Path of the login endpoint (default: "/account/ajax_login")
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// TCP/TLS connect timeout (default: 30 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Overall timeout for any single request, body included (None = unlimited)
    ///
    /// Leave unset for large exports; a bounded value aborts slow but healthy
    /// downloads.
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// Timeout applied to the small metadata listings (default: 60 seconds)
    #[serde(default = "default_metadata_timeout", with = "duration_serde")]
    pub metadata_timeout: Duration,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            login_path: default_login_path(),
            user_agent: default_user_agent(),
            connect_timeout: default_connect_timeout(),
            request_timeout: None,
            metadata_timeout: default_metadata_timeout(),
        }
    }
}

/// Where and how the exported CSV is written
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for the CSV/CSVT pair (None = system temporary directory)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// File name prefix of the generated CSV (default: "sv_export_")
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Maximum bytes written per chunk; progress and cancellation are checked once per chunk (default: 512)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            file_prefix: default_file_prefix(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl ExportConfig {
    /// Directory the export files are created in
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Parameters of the delimited-text layer built from the export
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Name given to the loaded layer (default: "socioeconomic_data_export")
    #[serde(default = "default_layer_name")]
    pub layer_name: String,

    /// Data provider key understood by the layer loader (default: "delimitedtext")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Coordinate reference system of the WKT geometries (default: "epsg:4326")
    #[serde(default = "default_crs")]
    pub crs: String,

    /// Number of preamble lines before the CSV header (default: 25)
    #[serde(default = "default_skip_lines")]
    pub skip_lines: u32,

    /// Name of the WKT geometry column (default: "geometry")
    #[serde(default = "default_geometry_field")]
    pub geometry_field: String,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            layer_name: default_layer_name(),
            provider: default_provider(),
            crs: default_crs(),
            skip_lines: default_skip_lines(),
            geometry_field: default_geometry_field(),
        }
    }
}

/// Main configuration
///
/// Sub-configs:
/// - [`platform`](PlatformConfig) - host, login endpoint, timeouts
/// - [`export`](ExportConfig) - output directory, file naming, chunk size
/// - [`layer`](LayerConfig) - delimited-text layer URI parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Remote platform settings
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Export file settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Layer hand-off settings
    #[serde(default)]
    pub layer: LayerConfig,

    /// Capacity of each task's event channel (default: 1000)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: PlatformConfig::default(),
            export: ExportConfig::default(),
            layer: LayerConfig::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Config {
    /// Configuration pointing at `host` with every other setting at its default
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            platform: PlatformConfig {
                host: host.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Check the settings that cannot be expressed in the type system
    pub fn validate(&self) -> Result<()> {
        let host = url::Url::parse(&self.platform.host).map_err(|e| {
            Error::config(
                format!("invalid host '{}': {}", self.platform.host, e),
                "platform.host",
            )
        })?;
        if !matches!(host.scheme(), "http" | "https") {
            return Err(Error::config(
                format!("unsupported scheme '{}'", host.scheme()),
                "platform.host",
            ));
        }
        if !self.platform.login_path.starts_with('/') {
            return Err(Error::config(
                "login path must start with '/'",
                "platform.login_path",
            ));
        }
        if self.export.chunk_size == 0 {
            return Err(Error::config(
                "chunk size must be greater than zero",
                "export.chunk_size",
            ));
        }
        if self.event_capacity == 0 {
            return Err(Error::config(
                "event capacity must be greater than zero",
                "event_capacity",
            ));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "https://platform.openquake.org".to_string()
}

fn default_login_path() -> String {
    "/account/ajax_login".to_string()
}

fn default_user_agent() -> String {
    concat!("sv-downloader/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_metadata_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_file_prefix() -> String {
    "sv_export_".to_string()
}

fn default_chunk_size() -> usize {
    512
}

fn default_layer_name() -> String {
    "socioeconomic_data_export".to_string()
}

fn default_provider() -> String {
    "delimitedtext".to_string()
}

fn default_crs() -> String {
    "epsg:4326".to_string()
}

fn default_skip_lines() -> u32 {
    25
}

fn default_geometry_field() -> String {
    "geometry".to_string()
}

fn default_event_capacity() -> usize {
    1000
}

// Duration serialization helper (serialize as seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
