use std::sync::Arc;

use chrono::{Duration, Utc};
use reader_storage::{
    DEFAULT_SMALL_CAPACITY, FilesystemIndexedStore, LocalStore, MemoryIndexedStore,
    RoutingPolicy, StorageError, StorageManager, format_bytes,
};
use reader_types::{
    Chapter, CustomFont, FontFormat, Novel, NovelId, ReadingProgress, Settings, StorageLocation,
};
use serde_json::json;
use tempfile::TempDir;

fn novel(id: &str, content: &str) -> Novel {
    Novel {
        id: NovelId::from(id),
        name: format!("{id}.txt"),
        chapters: vec![
            Chapter::new("Start", "opening"),
            Chapter::new("Chapter 1", content),
        ],
        size: content.len() as u64,
        last_modified: 1_700_000_000_000,
    }
}

async fn small_threshold_manager(threshold: u64) -> StorageManager {
    StorageManager::open(
        Arc::new(LocalStore::in_memory(DEFAULT_SMALL_CAPACITY)),
        Arc::new(MemoryIndexedStore::new()),
    )
    .await
    .with_policy(RoutingPolicy::new(threshold))
}

#[tokio::test]
async fn saved_novel_loads_back_unchanged() {
    let manager = StorageManager::in_memory().await;
    let original = novel("round-trip", "Some text\n\nwith a blank line");

    let location = manager.save_novel(&original).await.unwrap();
    assert_eq!(location, StorageLocation::SmallStore);

    let loaded = manager.load_novel(&original.id).await.unwrap();
    assert_eq!(loaded, Some(original));
    assert!(manager.load_novel(&NovelId::from("nope")).await.unwrap().is_none());
}

#[tokio::test]
async fn large_novels_go_to_the_large_tier() {
    let manager = StorageManager::in_memory().await;
    let big = novel("big", &"x".repeat(1024 * 1024 + 1));

    let location = manager.save_novel(&big).await.unwrap();
    assert_eq!(location, StorageLocation::LargeStore);

    let listed = manager.list_all_novels().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].location, StorageLocation::LargeStore);
    assert_eq!(listed[0].chapter_count, 2);
    assert_eq!(manager.load_novel(&big.id).await.unwrap(), Some(big));
}

#[tokio::test]
async fn resave_across_threshold_moves_the_novel() {
    let manager = small_threshold_manager(128).await;

    let short = novel("moving", "short");
    assert_eq!(
        manager.save_novel(&short).await.unwrap(),
        StorageLocation::SmallStore
    );

    let long = novel("moving", &"y".repeat(200));
    assert_eq!(
        manager.save_novel(&long).await.unwrap(),
        StorageLocation::LargeStore
    );

    let listed = manager.list_all_novels().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].location, StorageLocation::LargeStore);
    assert_eq!(manager.load_novel(&long.id).await.unwrap(), Some(long.clone()));

    // And back again.
    manager.save_novel(&short).await.unwrap();
    let listed = manager.list_all_novels().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].location, StorageLocation::SmallStore);
}

#[tokio::test]
async fn listing_orders_by_last_read() {
    let manager = small_threshold_manager(128).await;
    let long = "b".repeat(100);
    for (id, content) in [("old", "a"), ("new", long.as_str()), ("unread", "c")] {
        manager.save_novel(&novel(id, content)).await.unwrap();
    }

    let now = Utc::now();
    for (id, at) in [("old", now - Duration::hours(2)), ("new", now)] {
        manager
            .save_progress(&ReadingProgress {
                novel_id: NovelId::from(id),
                chapter_index: 1,
                scroll_position: 0.0,
                last_read: at,
            })
            .await
            .unwrap();
    }

    let ids: Vec<String> = manager
        .list_all_novels()
        .await
        .into_iter()
        .map(|n| n.id.to_string())
        .collect();
    assert_eq!(ids, vec!["new", "old", "unread"]);

    let recent = manager.recent_novels(1).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id.as_str(), "new");
    assert!(recent[0].last_read.is_some());
}

#[tokio::test]
async fn small_store_capacity_is_reported() {
    let manager = StorageManager::new(
        Arc::new(LocalStore::in_memory(300)),
        Arc::new(MemoryIndexedStore::new()),
    );
    manager.initialize().await.unwrap();

    manager.save_novel(&novel("first", &"x".repeat(100))).await.unwrap();
    let err = manager
        .save_novel(&novel("second", &"x".repeat(100)))
        .await
        .unwrap_err();
    assert!(err.is_capacity_exceeded(), "unexpected error: {err}");

    let listed = manager.list_all_novels().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id.as_str(), "first");
}

#[tokio::test]
async fn delete_removes_novel_and_progress() {
    let manager = StorageManager::in_memory().await;
    let stored = novel("gone", "text");
    manager.save_novel(&stored).await.unwrap();
    manager
        .save_progress(&ReadingProgress::now(stored.id.clone(), 1, 0.5))
        .await
        .unwrap();

    manager.delete_novel(&stored.id).await.unwrap();
    assert!(manager.load_novel(&stored.id).await.unwrap().is_none());
    assert!(manager.load_progress(&stored.id).await.is_none());
}

#[tokio::test]
async fn storage_info_counts_small_store_entries() {
    let manager = StorageManager::in_memory().await;
    assert_eq!(manager.storage_info().await.total_size, 0);

    manager.save_novel(&novel("a", "text")).await.unwrap();
    manager.save_settings(&Settings::default()).await.unwrap();

    let info = manager.storage_info().await;
    assert_eq!(info.items_count, 2);
    assert!(info.total_size > 0);
    assert_eq!(info.formatted_size, format_bytes(info.total_size));
}

#[tokio::test]
async fn import_with_wrong_version_changes_nothing() {
    let manager = StorageManager::in_memory().await;
    manager.save_novel(&novel("kept", "text")).await.unwrap();

    let bundle = json!({
        "version": "2.0",
        "exportDate": "2024-01-01T00:00:00Z",
        "novels": [serde_json::to_value(novel("incoming", "text")).unwrap()],
        "settings": {"fontSize": 30},
        "fonts": [],
    });
    let err = manager.import(&bundle).await.unwrap_err();
    assert!(matches!(err, StorageError::Format { .. }));

    let listed = manager.list_all_novels().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id.as_str(), "kept");
    assert_eq!(manager.load_settings().await, Settings::default());
}

#[tokio::test]
async fn import_skips_malformed_novels() {
    let manager = StorageManager::in_memory().await;
    let bundle = json!({
        "version": "1.0",
        "exportDate": "2024-01-01T00:00:00Z",
        "novels": [
            serde_json::to_value(novel("one", "text")).unwrap(),
            {"id": "broken", "name": "broken.txt", "chapters": "not a list"},
            serde_json::to_value(novel("two", "text")).unwrap(),
            {"id": "empty", "name": "empty.txt", "chapters": []},
        ],
        "settings": {"fontSize": 22},
        "fonts": [],
    });

    assert_eq!(manager.import(&bundle).await.unwrap(), 2);
    assert!(manager.load_novel(&NovelId::from("broken")).await.unwrap().is_none());
    assert!(manager.load_novel(&NovelId::from("empty")).await.unwrap().is_none());
    assert_eq!(manager.list_all_novels().await.len(), 2);
    assert_eq!(manager.load_settings().await.font_size, 22);
}

#[tokio::test]
async fn export_and_import_through_files() {
    let source_dir = TempDir::new().unwrap();
    let source = StorageManager::open(
        Arc::new(LocalStore::open(source_dir.path().join("local.json"), DEFAULT_SMALL_CAPACITY).unwrap()),
        Arc::new(FilesystemIndexedStore::new(source_dir.path().join("indexed"))),
    )
    .await
    .with_policy(RoutingPolicy::new(128));

    let small = novel("small", "tiny");
    let large = novel("large", &"z".repeat(500));
    source.save_novel(&small).await.unwrap();
    source.save_novel(&large).await.unwrap();
    let settings = Settings {
        font_size: 19,
        line_height: 2.0,
        ..Settings::default()
    };
    source.save_settings(&settings).await.unwrap();

    let backups = TempDir::new().unwrap();
    let path = source.export_to_dir(backups.path()).await.unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("novel-reader-backup-"));
    assert!(name.ends_with(".json"));

    let target_dir = TempDir::new().unwrap();
    let target = StorageManager::open(
        Arc::new(LocalStore::open(target_dir.path().join("local.json"), DEFAULT_SMALL_CAPACITY).unwrap()),
        Arc::new(FilesystemIndexedStore::new(target_dir.path().join("indexed"))),
    )
    .await;

    assert_eq!(target.import_file(&path).await.unwrap(), 2);
    assert_eq!(target.load_novel(&small.id).await.unwrap(), Some(small));
    assert_eq!(target.load_novel(&large.id).await.unwrap(), Some(large));
    assert_eq!(target.load_settings().await, settings);
}

#[tokio::test]
async fn small_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("local.json");
    let stored = novel("persisted", "text");

    {
        let manager = StorageManager::open(
            Arc::new(LocalStore::open(&path, DEFAULT_SMALL_CAPACITY).unwrap()),
            Arc::new(FilesystemIndexedStore::new(dir.path().join("indexed"))),
        )
        .await;
        manager.save_novel(&stored).await.unwrap();
    }

    let reopened = StorageManager::open(
        Arc::new(LocalStore::open(&path, DEFAULT_SMALL_CAPACITY).unwrap()),
        Arc::new(FilesystemIndexedStore::new(dir.path().join("indexed"))),
    )
    .await;
    assert_eq!(reopened.load_novel(&stored.id).await.unwrap(), Some(stored));
}

#[tokio::test]
async fn clearing_settings_also_removes_the_font() {
    let manager = StorageManager::in_memory().await;
    let settings = Settings {
        font_size: 24,
        ..Settings::default()
    };
    manager.save_settings(&settings).await.unwrap();
    manager
        .save_font(&CustomFont {
            id: "userFont".to_string(),
            name: "Serif".to_string(),
            data: "AAAA".to_string(),
            format: FontFormat::Truetype,
            file_type: "TTF".to_string(),
            uploaded_at: Utc::now(),
            size: 3,
        })
        .await
        .unwrap();
    assert_eq!(manager.load_settings().await, settings);
    assert!(manager.load_font().await.is_some());

    manager.delete_all_settings().await.unwrap();

    assert_eq!(manager.load_settings().await, Settings::default());
    assert!(manager.load_font().await.is_none());
}

#[tokio::test]
async fn large_novel_without_large_tier_is_unavailable() {
    let manager = StorageManager::new(
        Arc::new(LocalStore::in_memory(DEFAULT_SMALL_CAPACITY)),
        Arc::new(MemoryIndexedStore::new()),
    )
    .with_policy(RoutingPolicy::new(10));

    let big = novel("big", "far more than ten bytes of chapter text");
    let err = manager.save_novel(&big).await.unwrap_err();
    assert!(err.is_unavailable());
    assert!(manager.load_novel(&big.id).await.unwrap().is_none());
}
