//! Document model persisted by the store.
//!
//! Field names serialize in camelCase; the resulting JSON is the on-disk
//! format other tooling reads, so renames here are format changes.

use imghost_common::clock::DAY_MS;
use imghost_common::{ImageId, UserId};
use serde::{Deserialize, Serialize};

/// ID of the bootstrap administrator account.
pub const ADMIN_USER_ID: &str = "admin";

/// Root aggregate holding every persisted entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub users: Vec<User>,
    /// Newest first.
    #[serde(default)]
    pub images: Vec<ImageRecord>,
    #[serde(default)]
    pub settings: Settings,
}

impl Document {
    /// An empty document carrying the default branding.
    pub fn initial() -> Self {
        Self {
            users: Vec::new(),
            images: Vec::new(),
            settings: Settings {
                branding: Some(Branding::default()),
            },
        }
    }
}

/// Privilege tier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum UserLevel {
    #[default]
    Normal,
    Admin,
}

impl From<u8> for UserLevel {
    fn from(level: u8) -> Self {
        if level >= 1 {
            Self::Admin
        } else {
            Self::Normal
        }
    }
}

impl From<UserLevel> for u8 {
    fn from(level: UserLevel) -> Self {
        match level {
            UserLevel::Normal => 0,
            UserLevel::Admin => 1,
        }
    }
}

/// User account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Absent until the first login sets it.
    #[serde(default)]
    pub password_hash: Option<String>,
    pub api_key: String,
    #[serde(default)]
    pub level: UserLevel,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.level == UserLevel::Admin
    }
}

/// Partial update merged into an existing [`User`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub api_key: Option<String>,
    pub level: Option<UserLevel>,
}

impl UserUpdate {
    pub(crate) fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(hash) = self.password_hash {
            user.password_hash = Some(hash);
        }
        if let Some(key) = self.api_key {
            user.api_key = key;
        }
        if let Some(level) = self.level {
            user.level = level;
        }
    }
}

/// When an image should be removed automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Kept until the owner deletes it.
    #[default]
    Never,
    /// Removed once this many days have passed since upload.
    AfterDays(u32),
}

impl ExpiryPolicy {
    /// Instant (epoch ms) after which a record created at `created_at` is expired.
    /// An instant past the end of `i64` means the record never expires.
    pub fn expires_at(&self, created_at: i64) -> Option<i64> {
        match self {
            Self::Never => None,
            Self::AfterDays(days) => created_at.checked_add(i64::from(*days) * DAY_MS),
        }
    }
}

/// Metadata for one uploaded image and its thumbnail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "ImageRecordRepr", into = "ImageRecordRepr")]
pub struct ImageRecord {
    pub id: ImageId,
    pub owner_user_id: UserId,
    /// Blob key of the processed image.
    pub filename: String,
    /// Blob key of the thumbnail, if one was generated.
    pub thumb_name: Option<String>,
    pub mime: String,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub expiry: ExpiryPolicy,
}

impl ImageRecord {
    /// Whether the record is past its expiry at `now`. The expiry instant
    /// itself still counts as live.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expiry
            .expires_at(self.created_at)
            .is_some_and(|expiry| now > expiry)
    }
}

/// Wire shape of [`ImageRecord`]: `deleteAfterDays` is set iff `autoDelete`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageRecordRepr {
    id: ImageId,
    #[serde(alias = "userId")]
    owner_user_id: UserId,
    filename: String,
    #[serde(default)]
    thumb_name: Option<String>,
    #[serde(default)]
    mime: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    created_at: i64,
    #[serde(default)]
    auto_delete: bool,
    #[serde(default)]
    delete_after_days: Option<u32>,
}

impl From<ImageRecordRepr> for ImageRecord {
    fn from(repr: ImageRecordRepr) -> Self {
        // autoDelete without a usable day count never expires
        let expiry = match (repr.auto_delete, repr.delete_after_days) {
            (true, Some(days)) if days > 0 => ExpiryPolicy::AfterDays(days),
            _ => ExpiryPolicy::Never,
        };
        Self {
            id: repr.id,
            owner_user_id: repr.owner_user_id,
            filename: repr.filename,
            thumb_name: repr.thumb_name,
            mime: repr.mime,
            size: repr.size,
            width: repr.width,
            height: repr.height,
            created_at: repr.created_at,
            expiry,
        }
    }
}

impl From<ImageRecord> for ImageRecordRepr {
    fn from(record: ImageRecord) -> Self {
        let (auto_delete, delete_after_days) = match record.expiry {
            ExpiryPolicy::Never => (false, None),
            ExpiryPolicy::AfterDays(days) => (true, Some(days)),
        };
        Self {
            id: record.id,
            owner_user_id: record.owner_user_id,
            filename: record.filename,
            thumb_name: record.thumb_name,
            mime: record.mime,
            size: record.size,
            width: record.width,
            height: record.height,
            created_at: record.created_at,
            auto_delete,
            delete_after_days,
        }
    }
}

/// Site-wide settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<Branding>,
}

/// Display strings shown by the front end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branding {
    pub name: String,
    pub subtitle: String,
    pub icon: String,
    pub footer: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "Imghost".to_string(),
            subtitle: "Personal image hosting".to_string(),
            icon: String::new(),
            footer: "Imghost · self-hosted".to_string(),
        }
    }
}

/// Aggregate upload statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStats {
    pub total: usize,
    pub today: usize,
    pub total_size: u64,
}
