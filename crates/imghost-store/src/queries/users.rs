//! User account queries.

use imghost_common::UserId;

use super::EntityRepository;
use crate::models::{User, UserUpdate};

impl EntityRepository {
    pub fn find_user_by_id(&self, id: &UserId) -> Option<User> {
        self.store.read(|doc| doc.users.iter().find(|u| &u.id == id).cloned())
    }

    /// Case-sensitive username lookup.
    pub fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.store.read(|doc| doc.users.iter().find(|u| u.username == username).cloned())
    }

    pub fn find_user_by_api_key(&self, api_key: &str) -> Option<User> {
        self.store.read(|doc| doc.users.iter().find(|u| u.api_key == api_key).cloned())
    }

    pub fn list_users(&self) -> Vec<User> {
        self.store.read(|doc| doc.users.clone())
    }

    /// Append a user.
    ///
    /// Duplicate usernames or API keys are not rejected here; callers check
    /// with the `find_user_*` methods first.
    pub fn add_user(&self, user: User) {
        tracing::debug!(user_id = %user.id, username = %user.username, "Adding user");
        self.store.write(|doc| doc.users.push(user));
        self.store.mark_dirty();
    }

    /// Merge `update` into the user with `id`.
    ///
    /// Returns the updated user, or `None` (and leaves the store clean) if no
    /// such user exists.
    pub fn update_user(&self, id: &UserId, update: UserUpdate) -> Option<User> {
        let updated = self.store.write(|doc| {
            let user = doc.users.iter_mut().find(|u| &u.id == id)?;
            update.apply(user);
            Some(user.clone())
        });

        if updated.is_some() {
            self.store.mark_dirty();
        }
        updated
    }
}
