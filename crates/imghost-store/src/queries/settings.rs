//! Branding settings.

use super::EntityRepository;
use crate::models::Branding;

impl EntityRepository {
    /// Current branding, or the built-in default if none was ever stored.
    pub fn get_branding(&self) -> Branding {
        self.store.read(|doc| doc.settings.branding.clone()).unwrap_or_default()
    }

    /// Replace the branding wholesale.
    pub fn update_branding(&self, branding: Branding) {
        self.store.write(|doc| doc.settings.branding = Some(branding));
        self.store.mark_dirty();
    }
}
