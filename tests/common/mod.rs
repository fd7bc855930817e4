//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which points a full [`AppContext`] at a fresh
//! temporary directory, with the sweeper timer disabled so tests drive sweeps
//! themselves.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, RgbImage};
use imghost::config::Config;
use imghost::AppContext;
use tempfile::TempDir;

/// Test harness wrapping a started [`AppContext`] backed by a temp dir.
pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: TempDir,
}

impl TestHarness {
    /// Start with default configuration.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Start with the default configuration adjusted by `adjust`.
    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let ctx = AppContext::start(test_config(dir.path(), adjust))
            .await
            .expect("failed to start context");
        Self { ctx, dir }
    }

    /// Shut down and start again on the same directories.
    pub async fn restart(self) -> Self {
        let config = self.ctx.config.clone();
        self.ctx.shutdown().await.expect("shutdown failed");
        let ctx = AppContext::start(config)
            .await
            .expect("failed to restart context");
        Self { ctx, dir: self.dir }
    }

    pub fn db_path(&self) -> PathBuf {
        self.ctx.config.storage.data_dir.join("db.json")
    }

    pub fn upload_path(&self, key: &str) -> PathBuf {
        self.ctx.config.storage.upload_dir.join(key)
    }

    pub fn thumb_path(&self, key: &str) -> PathBuf {
        self.ctx.config.storage.upload_dir.join("thumbs").join(key)
    }
}

pub fn test_config(root: &Path, adjust: impl FnOnce(&mut Config)) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = root.join("data");
    config.storage.upload_dir = root.join("uploads");
    config.cleanup.enabled = false;
    adjust(&mut config);
    config
}

/// Encode a blank PNG of the given size.
pub fn png(width: u32, height: u32) -> Bytes {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut buf, ImageFormat::Png)
        .expect("failed to encode png");
    Bytes::from(buf.into_inner())
}
