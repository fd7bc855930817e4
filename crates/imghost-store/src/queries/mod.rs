//! Typed access to the document.
//!
//! [`EntityRepository`] is the only way to mutate the document held by a
//! [`PersistentStore`]. Reads return owned clones; every method that changes
//! something marks the store dirty before returning. Lookups are linear scans.
//!
//! The operations are split by entity:
//!
//! - `users` - account lookup, creation and partial updates
//! - `images` - upload records, owner-scoped and expiry deletion, statistics
//! - `settings` - the singleton branding value

mod images;
mod settings;
mod users;

use std::sync::Arc;

use crate::store::PersistentStore;

/// Repository over a shared [`PersistentStore`].
#[derive(Clone)]
pub struct EntityRepository {
    store: Arc<PersistentStore>,
}

impl EntityRepository {
    pub fn new(store: Arc<PersistentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<PersistentStore> {
        &self.store
    }
}
