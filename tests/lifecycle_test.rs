//! Integration tests for startup, persistence and shutdown.

mod common;

use std::time::{Duration, Instant};

use common::{png, test_config, TestHarness};
use imghost::images::UploadRequest;
use imghost::AppContext;
use imghost_common::UserId;
use imghost_store::{Branding, Document, UserLevel};

fn read_document(harness: &TestHarness) -> Document {
    let content = std::fs::read_to_string(harness.db_path()).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[tokio::test]
async fn test_fresh_start_persists_bootstrap_admin() {
    let harness = TestHarness::new().await;

    let doc = read_document(&harness);
    assert_eq!(doc.users.len(), 1);
    assert_eq!(doc.users[0].id.as_str(), "admin");
    assert_eq!(doc.users[0].level, UserLevel::Admin);
    assert!(!doc.users[0].api_key.is_empty());
    assert!(doc.images.is_empty());

    assert!(harness.upload_path("thumbs").is_dir());
    harness.ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_state_survives_restart() {
    let harness = TestHarness::new().await;
    let user = harness.ctx.accounts.register("alice", "secret1").unwrap();
    let record = harness
        .ctx
        .images
        .upload(&user.id, UploadRequest::new(png(32, 32), "image/png"))
        .await
        .unwrap();
    harness.ctx.repo.update_branding(Branding {
        name: "Mine".to_string(),
        ..Branding::default()
    });

    let harness = harness.restart().await;

    let alice = harness.ctx.repo.find_user_by_username("alice").unwrap();
    assert_eq!(alice.id, user.id);
    assert_eq!(
        harness.ctx.repo.get_image_by_id(&record.id),
        Some(record.clone())
    );
    assert_eq!(harness.ctx.repo.get_branding().name, "Mine");
    harness.ctx.accounts.login("alice", "secret1").unwrap();

    harness.ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_threshold_flushes_before_timer() {
    let harness = TestHarness::with_config(|c| {
        c.database.flush_interval_ms = 60_000;
        c.database.flush_threshold = 2;
    })
    .await;

    // let the scheduler's immediate first run pass
    tokio::time::sleep(Duration::from_millis(50)).await;

    harness.ctx.accounts.register("alice", "secret1").unwrap();
    harness.ctx.accounts.register("bob", "secret2").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let doc = read_document(&harness);
        if doc.users.iter().any(|u| u.username == "bob") {
            break;
        }
        assert!(Instant::now() < deadline, "threshold flush did not happen");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!harness.ctx.store.is_dirty());

    harness.ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_writes_pending_changes_once() {
    let harness = TestHarness::with_config(|c| {
        c.database.flush_interval_ms = 60_000;
        c.database.flush_threshold = 1000;
    })
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    harness.ctx.accounts.register("alice", "secret1").unwrap();
    assert!(harness.ctx.store.is_dirty());
    assert!(!read_document(&harness)
        .users
        .iter()
        .any(|u| u.username == "alice"));

    harness.ctx.shutdown().await.unwrap();
    harness.ctx.shutdown().await.unwrap();

    let in_memory = harness.ctx.store.read(|doc| doc.clone());
    assert_eq!(read_document(&harness), in_memory);
    assert!(!harness.ctx.store.is_dirty());

    // background flushes are refused once closed
    assert!(!harness.ctx.store.flush().await.unwrap());
}

#[tokio::test]
async fn test_corrupt_document_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), |_| {});
    std::fs::create_dir_all(&config.storage.data_dir).unwrap();
    std::fs::write(config.storage.data_dir.join("db.json"), "{ not json").unwrap();

    assert!(AppContext::start(config).await.is_err());
}

#[tokio::test]
async fn test_legacy_document_is_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), |_| {});
    std::fs::create_dir_all(&config.storage.data_dir).unwrap();
    std::fs::write(
        config.storage.data_dir.join("db.json"),
        r#"{
  "users": [],
  "images": [
    {
      "id": "legacyimg001",
      "userId": "someone-gone",
      "filename": "legacyimg001.png",
      "createdAt": 1,
      "autoDelete": true,
      "deleteAfterDays": null
    }
  ],
  "settings": {}
}"#,
    )
    .unwrap();

    let ctx = AppContext::start(config).await.unwrap();

    let users = ctx.repo.list_users();
    assert_eq!(users.len(), 1);
    assert!(users[0].is_admin());

    let adopted = ctx.repo.get_images_by_user(&UserId::from("admin"));
    assert_eq!(adopted.len(), 1);
    // autoDelete without a day count never expires
    assert!(ctx.repo.get_expired_images(i64::MAX).is_empty());
    assert_eq!(ctx.repo.get_branding(), Branding::default());

    ctx.shutdown().await.unwrap();
}
