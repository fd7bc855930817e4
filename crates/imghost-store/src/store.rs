//! Write-back document store.
//!
//! [`PersistentStore`] keeps the authoritative [`Document`] in memory and
//! writes it to a [`DocumentStorage`] lazily: on a fixed interval, or as soon
//! as the number of unsaved mutations reaches a threshold. On an unclean exit
//! at most one interval's (or one threshold's) worth of mutations is lost.

use imghost_common::clock::now_millis;
use imghost_common::{RecurringTask, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

use crate::bootstrap::ensure_bootstrap_admin;
use crate::models::Document;
use crate::storage::DocumentStorage;

/// When unsaved mutations are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushSettings {
    /// Maximum time a mutation stays unsaved.
    pub interval: Duration,
    /// Number of unsaved mutations that forces an immediate flush.
    pub threshold: u32,
}

impl Default for FlushSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            threshold: 10,
        }
    }
}

/// Snapshot of the store's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    pub dirty: bool,
    pub dirty_count: u32,
    /// Epoch ms of the last successful flush.
    pub last_saved_at: Option<i64>,
    pub shutting_down: bool,
}

struct DocumentState {
    document: Document,
    dirty: bool,
    dirty_count: u32,
    last_saved_at: Option<i64>,
}

/// In-memory document with lag-bounded persistence.
///
/// The document lock is only ever held for synchronous sections; flushes
/// serialize a snapshot and write it without holding it.
pub struct PersistentStore {
    state: Mutex<DocumentState>,
    storage: Arc<dyn DocumentStorage>,
    settings: FlushSettings,
    flush_lock: tokio::sync::Mutex<()>,
    flush_wake: Arc<Notify>,
    shutting_down: AtomicBool,
    scheduler: Mutex<Option<RecurringTask>>,
}

impl PersistentStore {
    /// Load the document and start the flush scheduler.
    ///
    /// Fails if the storage cannot be read or holds a corrupt document.
    pub async fn initialize(
        storage: Arc<dyn DocumentStorage>,
        settings: FlushSettings,
    ) -> Result<Arc<Self>> {
        let store = Arc::new(Self::open(storage, settings).await?);
        store.start_scheduler();
        tracing::info!(
            flush_interval_ms = settings.interval.as_millis() as u64,
            flush_threshold = settings.threshold,
            "Document store initialized"
        );
        Ok(store)
    }

    /// Load the document without starting the scheduler.
    ///
    /// A missing document is created with defaults and a document without
    /// the bootstrap admin is repaired; either way the result is saved at once.
    pub async fn open(storage: Arc<dyn DocumentStorage>, settings: FlushSettings) -> Result<Self> {
        let started = Instant::now();

        let (document, needs_save) = match storage.load().await? {
            Some(mut document) => {
                let repaired = ensure_bootstrap_admin(&mut document)?;
                (document, repaired)
            }
            None => {
                let mut document = Document::initial();
                ensure_bootstrap_admin(&mut document)?;
                (document, true)
            }
        };

        let mut last_saved_at = None;
        if needs_save {
            storage.save(&document).await?;
            last_saved_at = Some(now_millis());
        }

        tracing::info!(
            users = document.users.len(),
            images = document.images.len(),
            created_or_repaired = needs_save,
            duration_ms = started.elapsed().as_millis() as u64,
            "Document loaded"
        );

        Ok(Self {
            state: Mutex::new(DocumentState {
                document,
                dirty: false,
                dirty_count: 0,
                last_saved_at,
            }),
            storage,
            settings: FlushSettings {
                threshold: settings.threshold.max(1),
                ..settings
            },
            flush_lock: tokio::sync::Mutex::new(()),
            flush_wake: Arc::new(Notify::new()),
            shutting_down: AtomicBool::new(false),
            scheduler: Mutex::new(None),
        })
    }

    fn start_scheduler(self: &Arc<Self>) {
        let store = Arc::downgrade(self);
        let task = RecurringTask::spawn(
            "document-flush",
            self.settings.interval,
            Some(self.flush_wake.clone()),
            move || {
                let store = store.clone();
                async move {
                    if let Some(store) = store.upgrade() {
                        // failures are logged by flush and retried next round
                        let _ = store.flush().await;
                    }
                }
            },
        );
        *self.scheduler.lock() = Some(task);
    }

    pub fn settings(&self) -> FlushSettings {
        self.settings
    }

    /// Run `f` against the current document.
    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.state.lock().document)
    }

    /// Run `f` with mutable access. Callers must follow up with
    /// [`mark_dirty`](Self::mark_dirty) when they changed anything.
    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.state.lock().document)
    }

    /// Record one unsaved mutation; reaching the threshold wakes the flusher.
    pub fn mark_dirty(&self) {
        let reached = {
            let mut state = self.state.lock();
            state.dirty = true;
            state.dirty_count = state.dirty_count.saturating_add(1);
            state.dirty_count >= self.settings.threshold
        };

        if reached && !self.shutting_down.load(Ordering::SeqCst) {
            tracing::debug!("Flush threshold reached");
            self.flush_wake.notify_one();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    pub fn status(&self) -> StoreStatus {
        let state = self.state.lock();
        StoreStatus {
            dirty: state.dirty,
            dirty_count: state.dirty_count,
            last_saved_at: state.last_saved_at,
            shutting_down: self.shutting_down.load(Ordering::SeqCst),
        }
    }

    /// Write unsaved changes to storage.
    ///
    /// Returns `Ok(false)` when there was nothing to do or the store is
    /// shutting down. Concurrent calls queue behind the running flush. A
    /// failure leaves the store dirty so the next trigger retries.
    pub async fn flush(&self) -> Result<bool> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.flush_now().await
    }

    async fn flush_now(&self) -> Result<bool> {
        let _guard = self.flush_lock.lock().await;

        let (snapshot, captured) = {
            let state = self.state.lock();
            if !state.dirty {
                return Ok(false);
            }
            (state.document.clone(), state.dirty_count)
        };

        let started = Instant::now();
        if let Err(e) = self.storage.save(&snapshot).await {
            tracing::error!(pending = captured, "Failed to flush document: {}", e);
            return Err(e);
        }

        // mutations made while saving stay pending
        let remaining = {
            let mut state = self.state.lock();
            state.dirty_count = state.dirty_count.saturating_sub(captured);
            state.dirty = state.dirty_count > 0;
            state.last_saved_at = Some(now_millis());
            state.dirty_count
        };

        tracing::debug!(
            mutations = captured,
            remaining,
            duration_ms = started.elapsed().as_millis() as u64,
            "Document flushed"
        );
        Ok(true)
    }

    /// Stop the scheduler and write any unsaved changes. Idempotent.
    ///
    /// A flush already in progress completes first. Afterwards the store
    /// refuses background flushes.
    pub async fn shutdown(&self) -> Result<()> {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("Document store shutting down");

        let scheduler = self.scheduler.lock().take();
        if let Some(task) = scheduler {
            task.stop().await;
        }

        let flushed = self.flush_now().await?;
        tracing::info!(final_flush = flushed, "Document store closed");
        Ok(())
    }
}
