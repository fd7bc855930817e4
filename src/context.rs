//! Application lifecycle.
//!
//! [`AppContext`] wires the store, repository, blob storage and services
//! together and owns the background tasks. `start` brings everything up,
//! `shutdown` stops the sweeper and then closes the store with a final flush.

use std::sync::Arc;

use anyhow::{Context, Result};
use imghost_common::RecurringTask;
use imghost_store::{EntityRepository, FlushSettings, JsonFileStorage, PersistentStore};
use parking_lot::Mutex;

use crate::accounts::AccountService;
use crate::blobs::FsBlobStore;
use crate::config::Config;
use crate::images::{ImageService, RasterProcessor};
use crate::sweeper::ExpirySweeper;

/// Shared handles to every long-lived component.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<PersistentStore>,
    pub repo: EntityRepository,
    pub blobs: Arc<FsBlobStore>,
    pub images: Arc<ImageService>,
    pub accounts: Arc<AccountService>,
    pub sweeper: Arc<ExpirySweeper>,
    sweep_task: Mutex<Option<RecurringTask>>,
}

impl AppContext {
    /// Load the document, start the flush scheduler and the expiry sweeper.
    pub async fn start(config: Config) -> Result<Self> {
        let ctx = Self::build(config, true).await?;
        let task = ctx.sweeper.start(&ctx.config.cleanup);
        *ctx.sweep_task.lock() = task;
        Ok(ctx)
    }

    /// Load the document without any background tasks, for one-shot
    /// commands. Changes are written by [`shutdown`](Self::shutdown).
    pub async fn open(config: Config) -> Result<Self> {
        Self::build(config, false).await
    }

    async fn build(config: Config, background: bool) -> Result<Self> {
        let data_dir = &config.storage.data_dir;
        tokio::fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

        let blobs = Arc::new(FsBlobStore::new(&config.storage.upload_dir));
        blobs
            .ensure_dirs()
            .await
            .with_context(|| format!("Failed to create upload directory: {:?}", blobs.base_dir()))?;

        let storage = Arc::new(JsonFileStorage::in_dir(data_dir));
        tracing::info!("Loading document from {}", storage.path().display());

        let settings = FlushSettings {
            interval: config.database.flush_interval(),
            threshold: config.database.flush_threshold,
        };
        let store = if background {
            PersistentStore::initialize(storage, settings).await
        } else {
            PersistentStore::open(storage, settings).await.map(Arc::new)
        }
        .context("Failed to load document store")?;

        let repo = EntityRepository::new(store.clone());
        let processor = Arc::new(RasterProcessor::new(&config.images));
        let images = Arc::new(ImageService::new(
            repo.clone(),
            blobs.clone(),
            processor,
            config.images.clone(),
        ));
        let accounts = Arc::new(AccountService::new(repo.clone()));
        let sweeper = Arc::new(ExpirySweeper::new(repo.clone(), blobs.clone()));

        Ok(Self {
            config,
            store,
            repo,
            blobs,
            images,
            accounts,
            sweeper,
            sweep_task: Mutex::new(None),
        })
    }

    /// Stop the sweeper (letting a running sweep finish), then flush and
    /// close the store. Idempotent.
    pub async fn shutdown(&self) -> Result<()> {
        let task = self.sweep_task.lock().take();
        if let Some(task) = task {
            task.stop().await;
        }

        self.store
            .shutdown()
            .await
            .context("Failed to write document on shutdown")?;
        Ok(())
    }
}
