use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub images: ImageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding `db.json`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding uploaded images; thumbnails go to `thumbs/` inside it
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            upload_dir: default_upload_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Maximum time between a mutation and its flush
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Unsaved mutations that force an immediate flush
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: u32,
}

fn default_flush_interval_ms() -> u64 {
    5000
}
fn default_flush_threshold() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: default_flush_interval_ms(),
            flush_threshold: default_flush_threshold(),
        }
    }
}

impl DatabaseConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Run the expiry sweeper (default: true)
    #[serde(default = "default_cleanup_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,
}

fn default_cleanup_enabled() -> bool {
    true
}
fn default_cleanup_interval() -> u64 {
    3600
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: default_cleanup_enabled(),
            interval_secs: default_cleanup_interval(),
        }
    }
}

impl CleanupConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageConfig {
    /// Largest accepted upload in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Encoder quality for lossy outputs when an upload gives none
    #[serde(default = "default_webp_quality")]
    pub default_webp_quality: u8,

    /// Thumbnails fit inside a square of this many pixels
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,

    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,

    /// Watermark used when an upload asks for one without giving text
    #[serde(default = "default_watermark")]
    pub default_watermark: String,
}

fn default_max_file_size() -> u64 {
    100 * 1024 * 1024
}
fn default_webp_quality() -> u8 {
    90
}
fn default_thumbnail_size() -> u32 {
    400
}
fn default_allowed_mime_types() -> Vec<String> {
    [
        "image/png",
        "image/jpeg",
        "image/jpg",
        "image/gif",
        "image/webp",
        "image/svg+xml",
        "image/avif",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_watermark() -> String {
    "imghost".to_string()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            default_webp_quality: default_webp_quality(),
            thumbnail_size: default_thumbnail_size(),
            allowed_mime_types: default_allowed_mime_types(),
            default_watermark: default_watermark(),
        }
    }
}

impl ImageConfig {
    pub fn is_allowed_mime(&self, mime: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mime))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also append log lines to this file (e.g. `logs/app.log`)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}
