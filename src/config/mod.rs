mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    clamp_config(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./imghost.toml",
        "~/.config/imghost/config.toml",
        "/etc/imghost/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn clamp<T: PartialOrd + Copy + std::fmt::Display>(name: &str, value: &mut T, min: T, max: T) {
    let clamped = if *value < min {
        min
    } else if *value > max {
        max
    } else {
        return;
    };
    tracing::warn!("{} = {} is out of range [{}, {}]; using {}", name, value, min, max, clamped);
    *value = clamped;
}

/// Pull numeric settings back into their supported ranges
pub fn clamp_config(config: &mut Config) {
    let db = &mut config.database;
    clamp("database.flush_interval_ms", &mut db.flush_interval_ms, 1000, 60_000);
    clamp("database.flush_threshold", &mut db.flush_threshold, 1, 1000);

    clamp(
        "cleanup.interval_secs",
        &mut config.cleanup.interval_secs,
        60,
        u64::MAX,
    );

    let images = &mut config.images;
    clamp(
        "images.max_file_size",
        &mut images.max_file_size,
        1024,
        500 * 1024 * 1024,
    );
    clamp(
        "images.default_webp_quality",
        &mut images.default_webp_quality,
        10,
        100,
    );
    clamp("images.thumbnail_size", &mut images.thumbnail_size, 100, 1000);
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.storage.data_dir.as_os_str().is_empty() {
        anyhow::bail!("storage.data_dir cannot be empty");
    }

    if config.storage.upload_dir.as_os_str().is_empty() {
        anyhow::bail!("storage.upload_dir cannot be empty");
    }

    if config.images.allowed_mime_types.is_empty() {
        anyhow::bail!("images.allowed_mime_types cannot be empty");
    }

    if !config.cleanup.enabled {
        tracing::info!("Expired image cleanup is disabled");
    }

    Ok(())
}
