//! Background removal of expired images.
//!
//! Each sweep asks the repository for expired records, deletes their blobs
//! and then the records themselves. Sweeps never overlap: a trigger that
//! arrives while one is running is skipped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use imghost_common::clock::now_millis;
use imghost_common::{ImageId, RecurringTask};
use imghost_store::EntityRepository;

use crate::blobs::{BlobKind, BlobStore};
use crate::config::CleanupConfig;

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired records found.
    pub expired: usize,
    pub files_removed: usize,
    pub thumbs_removed: usize,
    pub records_removed: usize,
    /// Blob keys whose deletion failed; their records are gone regardless.
    pub orphaned_blobs: Vec<String>,
    pub duration: Duration,
}

pub struct ExpirySweeper {
    repo: EntityRepository,
    blobs: Arc<dyn BlobStore>,
    running: AtomicBool,
}

/// Clears the running flag when a sweep ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ExpirySweeper {
    pub fn new(repo: EntityRepository, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            repo,
            blobs,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one sweep now. Returns `None` if a sweep is already running.
    pub async fn tick(&self) -> Option<SweepReport> {
        self.tick_at(now_millis()).await
    }

    /// Run one sweep treating `now` (epoch ms) as the current time.
    pub async fn tick_at(&self, now: i64) -> Option<SweepReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Expiry sweep already running; skipping");
            return None;
        }
        let _guard = RunGuard(&self.running);

        let started = Instant::now();
        let expired = self.repo.get_expired_images(now);
        if expired.is_empty() {
            return Some(SweepReport {
                duration: started.elapsed(),
                ..Default::default()
            });
        }

        tracing::info!(records = expired.len(), "Removing expired images");

        let mut report = SweepReport {
            expired: expired.len(),
            ..Default::default()
        };

        for img in &expired {
            if self.remove(BlobKind::Image, &img.filename, &img.id, &mut report).await {
                report.files_removed += 1;
            }
            if let Some(thumb) = &img.thumb_name {
                if self.remove(BlobKind::Thumbnail, thumb, &img.id, &mut report).await {
                    report.thumbs_removed += 1;
                }
            }
        }

        let ids: Vec<ImageId> = expired.into_iter().map(|img| img.id).collect();
        report.records_removed = self.repo.delete_expired_image_records(&ids);
        report.duration = started.elapsed();

        tracing::info!(
            files_removed = report.files_removed,
            thumbs_removed = report.thumbs_removed,
            records_removed = report.records_removed,
            orphaned_blobs = report.orphaned_blobs.len(),
            duration_ms = report.duration.as_millis() as u64,
            "Expiry sweep finished"
        );

        Some(report)
    }

    /// Delete one blob, recording it as orphaned on failure. Returns whether
    /// a file was actually removed.
    async fn remove(
        &self,
        kind: BlobKind,
        key: &str,
        image_id: &ImageId,
        report: &mut SweepReport,
    ) -> bool {
        match self.blobs.delete(kind, key).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(%image_id, %kind, key, "Failed to delete expired blob: {}", e);
                report.orphaned_blobs.push(key.to_string());
                false
            }
        }
    }

    /// Start sweeping on the configured interval, with a first sweep right
    /// away. Returns `None` when cleanup is disabled.
    pub fn start(self: &Arc<Self>, config: &CleanupConfig) -> Option<RecurringTask> {
        if !config.enabled {
            tracing::info!("Expiry sweeper disabled");
            return None;
        }

        let sweeper = Arc::clone(self);
        let task = RecurringTask::spawn("expiry-sweep", config.interval(), None, move || {
            let sweeper = Arc::clone(&sweeper);
            async move {
                sweeper.tick().await;
            }
        });

        tracing::info!(interval_secs = config.interval_secs, "Expiry sweeper started");
        Some(task)
    }
}
