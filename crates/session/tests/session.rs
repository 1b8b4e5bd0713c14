use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reader_session::{ReaderError, ReaderSession};
use reader_storage::{
    Collection, DEFAULT_SMALL_CAPACITY, LocalStore, MemoryIndexedStore, StorageManager, Tier,
};
use reader_types::{
    FONT_ID, FontFormat, NovelId, ReadingProgress, SettingKey, Settings, StorageLocation,
};
use serde_json::Value;
use tempfile::TempDir;

const THREE_CHAPTERS: &str = "Chapter 1\nA\nChapter 2\nB\nChapter 3\nC";

async fn session() -> ReaderSession {
    ReaderSession::new(Arc::new(StorageManager::in_memory().await))
}

async fn open_three_chapters(session: &mut ReaderSession) -> NovelId {
    session.open_text("three.txt", THREE_CHAPTERS).await.unwrap();
    session.novel().unwrap().id.clone()
}

#[tokio::test]
async fn navigation_is_guarded_at_both_ends() {
    let mut session = session().await;
    assert!(matches!(session.next(), Err(ReaderError::NoOpenNovel)));

    let id = open_three_chapters(&mut session).await;
    assert_eq!(session.chapters().len(), 3);
    assert_eq!(session.chapter_index(), Some(0));

    assert!(!session.prev().unwrap());
    assert!(session.next().unwrap());
    assert_eq!(session.current_chapter().unwrap().content, "B");

    assert!(matches!(
        session.jump_to(3),
        Err(ReaderError::ChapterOutOfRange { index: 3, count: 3 })
    ));
    session.jump_to(2).unwrap();
    assert!(!session.has_next());
    assert!(!session.next().unwrap());
    assert_eq!(session.chapter_index(), Some(2));

    session.settle().await;
    let progress = session.storage().load_progress(&id).await.unwrap();
    assert_eq!(progress.chapter_index, 2);
    assert_eq!(progress.scroll_position, 0.0);
}

#[tokio::test(start_paused = true)]
async fn scroll_is_saved_after_a_quiet_period() {
    let mut session = session().await;
    let id = open_three_chapters(&mut session).await;

    for position in [10.0, 20.0, 30.0] {
        session.record_scroll(position).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(session.storage().load_progress(&id).await.is_none());

    tokio::time::sleep(Duration::from_millis(500)).await;
    let progress = session.storage().load_progress(&id).await.unwrap();
    assert_eq!(progress.scroll_position, 30.0);
}

#[tokio::test(start_paused = true)]
async fn flush_writes_pending_scroll_immediately() {
    let mut session = session().await;
    let id = open_three_chapters(&mut session).await;

    session.record_scroll(42.0).unwrap();
    session.flush().await.unwrap();

    let progress = session.storage().load_progress(&id).await.unwrap();
    assert_eq!(progress.scroll_position, 42.0);
}

#[tokio::test]
async fn reopening_resumes_and_clamps_progress() {
    let mut session = session().await;
    let id = open_three_chapters(&mut session).await;
    session.close().await.unwrap();
    assert!(!session.is_open());

    session
        .storage()
        .save_progress(&ReadingProgress::now(id.clone(), 99, 12.5))
        .await
        .unwrap();
    session.open_stored(&id).await.unwrap();
    assert_eq!(session.chapter_index(), Some(2));
    assert_eq!(session.scroll_position(), 12.5);

    let missing = NovelId::from("missing");
    assert!(matches!(
        session.open_stored(&missing).await,
        Err(ReaderError::NovelNotFound { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn settings_changes_are_coalesced() {
    let mut session = session().await;

    session.set_setting(SettingKey::FontSize, "18").unwrap();
    session.set_setting(SettingKey::FontSize, "20").unwrap();
    session.set_setting(SettingKey::LineHeight, "2.0").unwrap();
    assert!(session.set_setting(SettingKey::FontWeight, "bold").is_err());
    assert_eq!(session.storage().load_settings().await, Settings::default());

    tokio::time::sleep(Duration::from_millis(150)).await;
    let stored = session.storage().load_settings().await;
    assert_eq!(stored.font_size, 20);
    assert_eq!(stored.line_height, 2.0);

    session.reset_text_style().await.unwrap();
    let stored = session.storage().load_settings().await;
    assert_eq!(stored.font_size, Settings::default().font_size);
    assert_eq!(stored.line_height, 2.0);
}

#[tokio::test]
async fn font_upload_and_reset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Reader.otf");
    std::fs::write(&path, [7u8; 16]).unwrap();

    let mut session = session().await;
    let font = session.upload_font(&path).await.unwrap().clone();
    assert_eq!(font.id, FONT_ID);
    assert_eq!(font.name, "Reader");
    assert_eq!(font.format, FontFormat::Opentype);
    assert_eq!(font.file_type, "OTF");
    assert_eq!(font.size, 16);

    let mut reloaded = ReaderSession::new(Arc::clone(session.storage()));
    reloaded.load_preferences().await;
    assert_eq!(reloaded.font(), Some(&font));

    reloaded.reset_font().await.unwrap();
    assert!(reloaded.font().is_none());
    assert!(session.storage().load_font().await.is_none());

    let bad = dir.path().join("Reader.eot");
    std::fs::write(&bad, [0u8; 4]).unwrap();
    assert!(matches!(
        session.upload_font(&bad).await,
        Err(ReaderError::UnsupportedFont { .. })
    ));
}

#[tokio::test]
async fn opening_a_text_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("my novel.txt");
    std::fs::write(&path, "Preface\n第一章 开始\n内容\n第二章 继续\n更多").unwrap();

    let mut session = session().await;
    session.open_text_file(&path).await.unwrap();

    let titles: Vec<&str> = session.chapters().iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Start", "第一章 开始", "第二章 继续"]);
    assert!(session.novel().unwrap().id.as_str().starts_with("my_novel.txt_"));

    let empty = dir.path().join("empty.txt");
    std::fs::write(&empty, "  \n\n ").unwrap();
    assert!(matches!(
        session.open_text_file(&empty).await,
        Err(ReaderError::Parse(_))
    ));
}

#[tokio::test]
async fn removing_the_open_novel_closes_it() {
    let mut session = session().await;
    let id = open_three_chapters(&mut session).await;
    session.next().unwrap();

    session.remove_novel(&id).await.unwrap();
    assert!(!session.is_open());
    assert!(session.storage().load_progress(&id).await.is_none());
    assert!(session.storage().list_all_novels().await.is_empty());

    open_three_chapters(&mut session).await;
    session.clear_library().await.unwrap();
    assert!(!session.is_open());
    assert!(session.storage().list_all_novels().await.is_empty());
}

/// Small tier whose progress writes take a while to land.
struct SlowProgressStore {
    inner: LocalStore,
    delay: Duration,
}

#[async_trait]
impl Tier for SlowProgressStore {
    fn location(&self) -> StorageLocation {
        self.inner.location()
    }

    async fn put(&self, collection: Collection, key: &str, value: &Value) -> reader_storage::Result<()> {
        if collection == Collection::Progress {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.put(collection, key, value).await
    }

    async fn get(&self, collection: Collection, key: &str) -> reader_storage::Result<Option<Value>> {
        self.inner.get(collection, key).await
    }

    async fn delete(&self, collection: Collection, key: &str) -> reader_storage::Result<bool> {
        self.inner.delete(collection, key).await
    }

    async fn keys(&self, collection: Collection) -> reader_storage::Result<Vec<String>> {
        self.inner.keys(collection).await
    }

    async fn list_all(&self, collection: Collection) -> reader_storage::Result<Vec<Value>> {
        self.inner.list_all(collection).await
    }

    async fn clear(&self, collection: Collection) -> reader_storage::Result<()> {
        self.inner.clear(collection).await
    }

    async fn entry_count(&self) -> reader_storage::Result<usize> {
        self.inner.entry_count().await
    }

    async fn usage(&self) -> reader_storage::Result<Option<u64>> {
        self.inner.usage().await
    }
}

#[tokio::test(start_paused = true)]
async fn removing_while_a_scroll_save_is_writing_leaves_no_progress() {
    let small = SlowProgressStore {
        inner: LocalStore::in_memory(DEFAULT_SMALL_CAPACITY),
        delay: Duration::from_secs(1),
    };
    let storage = StorageManager::open(Arc::new(small), Arc::new(MemoryIndexedStore::new())).await;
    let mut session = ReaderSession::new(Arc::new(storage));
    let id = open_three_chapters(&mut session).await;

    session.record_scroll(12.0).unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    session.remove_novel(&id).await.unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(session.storage().load_progress(&id).await.is_none());
    assert!(session.storage().load_novel(&id).await.unwrap().is_none());
}
