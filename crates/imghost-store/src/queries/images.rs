//! Image record queries.

use imghost_common::clock::local_day_bounds;
use imghost_common::{ImageId, UserId};
use std::collections::HashSet;

use super::EntityRepository;
use crate::models::{ImageRecord, ImageStats};

impl EntityRepository {
    /// Insert a record at the front, keeping the list newest-first.
    pub fn add_image(&self, record: ImageRecord) {
        self.store.write(|doc| doc.images.insert(0, record));
        self.store.mark_dirty();
    }

    pub fn get_image_by_id(&self, id: &ImageId) -> Option<ImageRecord> {
        self.store.read(|doc| doc.images.iter().find(|img| &img.id == id).cloned())
    }

    /// All records owned by `user_id`, newest first.
    pub fn get_images_by_user(&self, user_id: &UserId) -> Vec<ImageRecord> {
        self.store.read(|doc| {
            doc.images
                .iter()
                .filter(|img| &img.owner_user_id == user_id)
                .cloned()
                .collect()
        })
    }

    /// Remove the records in `ids` that belong to `owner`.
    ///
    /// IDs of other users' records are ignored. Returns how many records were
    /// removed; the store is only marked dirty if that is non-zero.
    pub fn delete_images(&self, ids: &[ImageId], owner: &UserId) -> usize {
        let ids: HashSet<&ImageId> = ids.iter().collect();
        let removed = self.store.write(|doc| {
            let before = doc.images.len();
            doc.images
                .retain(|img| !(&img.owner_user_id == owner && ids.contains(&img.id)));
            before - doc.images.len()
        });

        if removed > 0 {
            self.store.mark_dirty();
            tracing::debug!(user_id = %owner, removed, "Deleted image records");
        }
        removed
    }

    /// Records whose expiry lies strictly before `now` (epoch ms).
    pub fn get_expired_images(&self, now: i64) -> Vec<ImageRecord> {
        self.store.read(|doc| {
            doc.images
                .iter()
                .filter(|img| img.is_expired_at(now))
                .cloned()
                .collect()
        })
    }

    /// Remove records by ID regardless of owner. Maintenance use only.
    pub fn delete_expired_image_records(&self, ids: &[ImageId]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let ids: HashSet<&ImageId> = ids.iter().collect();
        let removed = self.store.write(|doc| {
            let before = doc.images.len();
            doc.images.retain(|img| !ids.contains(&img.id));
            before - doc.images.len()
        });

        if removed > 0 {
            self.store.mark_dirty();
        }
        removed
    }

    /// Uploads by `user_id` during the local calendar day containing `now`.
    pub fn get_today_upload_count(&self, user_id: &UserId, now: i64) -> usize {
        let (start, end) = local_day_bounds(now);
        self.store.read(|doc| {
            doc.images
                .iter()
                .filter(|img| {
                    &img.owner_user_id == user_id
                        && img.created_at >= start
                        && img.created_at <= end
                })
                .count()
        })
    }

    /// Totals across every user, with "today" relative to `now`.
    pub fn get_stats(&self, now: i64) -> ImageStats {
        let (start, end) = local_day_bounds(now);
        self.store.read(|doc| ImageStats {
            total: doc.images.len(),
            today: doc
                .images
                .iter()
                .filter(|img| img.created_at >= start && img.created_at <= end)
                .count(),
            total_size: doc.images.iter().map(|img| img.size).sum(),
        })
    }
}
