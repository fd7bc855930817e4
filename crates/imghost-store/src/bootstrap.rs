//! Bootstrap administrator guarantee.

use imghost_common::clock::now_millis;
use imghost_common::tokens::generate_api_key;
use imghost_common::{Result, UserId};

use crate::credentials::hash_password;
use crate::models::{Document, User, UserLevel, ADMIN_USER_ID};

/// Username and initial password of the bootstrap administrator.
pub const ADMIN_USERNAME: &str = "admin";
const ADMIN_DEFAULT_PASSWORD: &str = "admin";

/// Build a fresh bootstrap administrator.
pub fn bootstrap_admin() -> Result<User> {
    Ok(User {
        id: UserId::from(ADMIN_USER_ID),
        username: ADMIN_USERNAME.to_string(),
        password_hash: Some(hash_password(ADMIN_DEFAULT_PASSWORD)?),
        api_key: generate_api_key(),
        level: UserLevel::Admin,
        created_at: now_millis(),
    })
}

/// Make sure `doc` has a user with id `admin`.
///
/// With no users at all, the admin becomes the only user and adopts every
/// existing image record. With other users present, the admin is inserted
/// first and nothing else changes. Returns whether `doc` was modified.
pub fn ensure_bootstrap_admin(doc: &mut Document) -> Result<bool> {
    if doc.users.iter().any(|u| u.id.as_str() == ADMIN_USER_ID) {
        return Ok(false);
    }

    let admin = bootstrap_admin()?;

    if doc.users.is_empty() {
        for image in &mut doc.images {
            image.owner_user_id = admin.id.clone();
        }
        tracing::info!(
            adopted_images = doc.images.len(),
            "Created bootstrap admin user"
        );
    } else {
        tracing::warn!(
            users = doc.users.len(),
            "Bootstrap admin user missing; restoring it"
        );
    }

    doc.users.insert(0, admin);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::verify_password;
    use crate::models::{ExpiryPolicy, ImageRecord};
    use imghost_common::ImageId;

    fn user(id: &str) -> User {
        User {
            id: UserId::from(id),
            username: id.to_string(),
            password_hash: None,
            api_key: format!("key-{id}"),
            level: UserLevel::Normal,
            created_at: 0,
        }
    }

    fn image(owner: &str) -> ImageRecord {
        ImageRecord {
            id: ImageId::generate(),
            owner_user_id: UserId::from(owner),
            filename: "f.webp".to_string(),
            thumb_name: None,
            mime: "image/webp".to_string(),
            size: 1,
            width: 1,
            height: 1,
            created_at: 0,
            expiry: ExpiryPolicy::Never,
        }
    }

    #[test]
    fn test_empty_document_gets_single_admin() {
        let mut doc = Document::initial();
        assert!(ensure_bootstrap_admin(&mut doc).unwrap());

        assert_eq!(doc.users.len(), 1);
        let admin = &doc.users[0];
        assert_eq!(admin.id.as_str(), "admin");
        assert_eq!(admin.level, UserLevel::Admin);
        assert!(!admin.api_key.is_empty());
        assert!(verify_password("admin", admin.password_hash.as_deref().unwrap()));
    }

    #[test]
    fn test_orphaned_images_adopted_when_no_users() {
        let mut doc = Document::initial();
        doc.images.push(image("ghost"));
        ensure_bootstrap_admin(&mut doc).unwrap();
        assert_eq!(doc.images[0].owner_user_id.as_str(), "admin");
    }

    #[test]
    fn test_existing_users_kept_when_admin_missing() {
        let mut doc = Document::initial();
        doc.users.push(user("alice"));
        doc.images.push(image("alice"));

        assert!(ensure_bootstrap_admin(&mut doc).unwrap());
        assert_eq!(doc.users.len(), 2);
        assert_eq!(doc.users[0].id.as_str(), "admin");
        assert_eq!(doc.users[1].id.as_str(), "alice");
        assert_eq!(doc.images[0].owner_user_id.as_str(), "alice");
    }

    #[test]
    fn test_present_admin_is_noop() {
        let mut doc = Document::initial();
        doc.users.push(user("admin"));
        let before = doc.clone();
        assert!(!ensure_bootstrap_admin(&mut doc).unwrap());
        assert_eq!(doc, before);
    }
}
