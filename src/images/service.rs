//! Image service coordinating processing, blob storage and image records.
//!
//! Uploads are validated and re-encoded on the blocking pool, written to the
//! [`BlobStore`], and only then recorded through the [`EntityRepository`].

use std::sync::Arc;

use bytes::Bytes;
use imghost_common::clock::now_millis;
use imghost_common::{Error, ImageId, Result, UserId};
use imghost_store::{EntityRepository, ExpiryPolicy, ImageRecord};

use super::processor::{ImageProcessor, ProcessOptions, ProcessedImage};
use crate::blobs::{BlobKind, BlobStore};
use crate::config::ImageConfig;

/// Days an auto-deleting upload lives when the request gives none.
pub const DEFAULT_DELETE_DAYS: u32 = 30;
/// Largest page size accepted by [`ImageService::list_page`].
pub const MAX_PAGE_SIZE: usize = 60;

/// One upload as received from a client.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    /// Content type declared by the client.
    pub mime: String,
    pub compress: bool,
    /// Encoder quality; the configured default when absent.
    pub quality: Option<u8>,
    pub watermark: bool,
    /// Watermark text; the configured default when absent or blank.
    pub watermark_text: Option<String>,
    pub auto_delete: bool,
    /// Lifetime in days when `auto_delete` is set, clamped to 1-365.
    pub delete_days: Option<u32>,
}

impl UploadRequest {
    /// A plain upload: compressed, no watermark, kept forever.
    pub fn new(data: impl Into<Bytes>, mime: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime: mime.into(),
            compress: true,
            quality: None,
            watermark: false,
            watermark_text: None,
            auto_delete: false,
            delete_days: None,
        }
    }

    fn expiry(&self) -> ExpiryPolicy {
        if self.auto_delete {
            let days = self.delete_days.unwrap_or(DEFAULT_DELETE_DAYS).clamp(1, 365);
            ExpiryPolicy::AfterDays(days)
        } else {
            ExpiryPolicy::Never
        }
    }
}

/// A page of a user's images, newest first.
#[derive(Debug, Clone)]
pub struct ImagePage {
    pub images: Vec<ImageRecord>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// High-level image operations used by request handlers.
pub struct ImageService {
    repo: EntityRepository,
    blobs: Arc<dyn BlobStore>,
    processor: Arc<dyn ImageProcessor>,
    config: ImageConfig,
}

impl ImageService {
    /// Create a new `ImageService`.
    ///
    /// # Arguments
    ///
    /// * `repo` - Repository the image records are written to
    /// * `blobs` - Storage for processed images and thumbnails
    /// * `processor` - Validation and re-encoding pipeline
    /// * `config` - Upload limits and encoder defaults
    pub fn new(
        repo: EntityRepository,
        blobs: Arc<dyn BlobStore>,
        processor: Arc<dyn ImageProcessor>,
        config: ImageConfig,
    ) -> Self {
        Self {
            repo,
            blobs,
            processor,
            config,
        }
    }

    /// Validate, process and store an upload, then record it for `owner`.
    ///
    /// Blobs are written before the record, so a failed upload never leaves a
    /// record pointing at missing files.
    pub async fn upload(&self, owner: &UserId, request: UploadRequest) -> Result<ImageRecord> {
        if !self.config.is_allowed_mime(&request.mime) {
            return Err(Error::invalid_input(format!(
                "unsupported file type: {}",
                request.mime
            )));
        }

        let options = ProcessOptions {
            compress_to_webp: request.compress,
            quality: request
                .quality
                .unwrap_or(self.config.default_webp_quality)
                .clamp(10, 100),
            watermark: request.watermark.then(|| {
                request
                    .watermark_text
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| self.config.default_watermark.clone())
            }),
        };

        let (processed, thumbnail) = self.run_pipeline(request.data.clone(), options).await?;

        let id = ImageId::generate();
        let filename = format!("{}.{}", id, processed.extension);
        self.blobs
            .store(BlobKind::Image, &filename, processed.data.clone())
            .await?;

        let thumb_name = match thumbnail {
            Some(thumb) => {
                let name = format!("{id}_thumb.webp");
                if let Err(e) = self.blobs.store(BlobKind::Thumbnail, &name, thumb).await {
                    self.remove_blob(BlobKind::Image, &filename).await;
                    return Err(e);
                }
                Some(name)
            }
            None => None,
        };

        let record = ImageRecord {
            id,
            owner_user_id: owner.clone(),
            filename,
            thumb_name,
            mime: processed.mime.clone(),
            size: processed.size(),
            width: processed.width,
            height: processed.height,
            created_at: now_millis(),
            expiry: request.expiry(),
        };
        self.repo.add_image(record.clone());

        tracing::info!(
            image_id = %record.id,
            user_id = %owner,
            bytes = record.size,
            mime = %record.mime,
            "Stored upload"
        );

        Ok(record)
    }

    async fn run_pipeline(
        &self,
        data: Bytes,
        options: ProcessOptions,
    ) -> Result<(ProcessedImage, Option<Bytes>)> {
        let processor = Arc::clone(&self.processor);
        tokio::task::spawn_blocking(move || -> Result<(ProcessedImage, Option<Bytes>)> {
            processor.validate(&data)?;
            let processed = processor.process(&data, &options)?;
            let thumbnail = match processor.thumbnail(&processed.data) {
                Ok(thumb) => Some(thumb),
                Err(e) => {
                    tracing::warn!("Thumbnail generation failed: {}", e);
                    None
                }
            };
            Ok((processed, thumbnail))
        })
        .await
        .map_err(|e| Error::internal(format!("image pipeline panicked: {e}")))?
    }

    /// Fetch one page of `owner`'s images. `page` is 1-based; `limit` is
    /// clamped to 1-60.
    pub fn list_page(&self, owner: &UserId, page: usize, limit: usize) -> ImagePage {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let page = page.max(1);

        let all = self.repo.get_images_by_user(owner);
        let total = all.len();
        let images = all
            .into_iter()
            .skip(page.saturating_sub(1).saturating_mul(limit))
            .take(limit)
            .collect();

        ImagePage {
            images,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }

    /// Delete `owner`'s images among `ids`, blobs first. Ids that are missing
    /// or belong to someone else are skipped. Returns the records removed.
    pub async fn delete_for_user(&self, owner: &UserId, ids: &[ImageId]) -> usize {
        let targets: Vec<ImageRecord> = self
            .repo
            .get_images_by_user(owner)
            .into_iter()
            .filter(|img| ids.contains(&img.id))
            .collect();

        for img in &targets {
            self.remove_blob(BlobKind::Image, &img.filename).await;
            if let Some(thumb) = &img.thumb_name {
                self.remove_blob(BlobKind::Thumbnail, thumb).await;
            }
        }

        let ids: Vec<ImageId> = targets.into_iter().map(|img| img.id).collect();
        let removed = self.repo.delete_images(&ids, owner);
        if removed > 0 {
            tracing::info!(user_id = %owner, records = removed, "Deleted images");
        }
        removed
    }

    /// Delete a single image owned by `owner`.
    pub async fn delete_one(&self, owner: &UserId, id: &ImageId) -> Result<()> {
        match self.delete_for_user(owner, std::slice::from_ref(id)).await {
            0 => Err(Error::not_found("image", id.as_str())),
            _ => Ok(()),
        }
    }

    async fn remove_blob(&self, kind: BlobKind, key: &str) {
        if let Err(e) = self.blobs.delete(kind, key).await {
            tracing::warn!(%kind, key, "Failed to delete blob: {}", e);
        }
    }
}
