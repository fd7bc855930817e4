//! Imghost-Store: the persistent write-back document store.
//!
//! All persisted state lives in one [`Document`] held in memory by a
//! [`PersistentStore`] and written lazily to a [`DocumentStorage`].
//!
//! # Modules
//!
//! - `models` - Document, users, image records, branding
//! - `storage` - Durable storage trait with JSON-file and in-memory backends
//! - `store` - The in-memory store and its flush scheduler
//! - `queries` - [`EntityRepository`], the typed mutation API
//! - `bootstrap` - Guaranteed admin account
//! - `credentials` - Password hashing
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use imghost_store::{EntityRepository, FlushSettings, JsonFileStorage, PersistentStore};
//!
//! # async fn run() -> imghost_common::Result<()> {
//! let storage = Arc::new(JsonFileStorage::new("./data/db.json"));
//! let store = PersistentStore::initialize(storage, FlushSettings::default()).await?;
//! let repo = EntityRepository::new(store.clone());
//!
//! let admin = repo.find_user_by_username("admin");
//! assert!(admin.is_some());
//!
//! store.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod credentials;
pub mod models;
pub mod queries;
pub mod storage;
pub mod store;

pub use models::{
    Branding, Document, ExpiryPolicy, ImageRecord, ImageStats, User, UserLevel, UserUpdate,
};
pub use queries::EntityRepository;
pub use storage::{DocumentStorage, JsonFileStorage, MemoryStorage};
pub use store::{FlushSettings, PersistentStore, StoreStatus};
