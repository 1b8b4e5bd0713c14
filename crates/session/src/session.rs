//! The reader session: what is open, where the reader is and how text looks.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reader_parser::{Segmenter, TextSource, read_text_file};
use reader_storage::StorageManager;
use reader_types::{
    Chapter, CustomFont, Novel, NovelId, ReadingProgress, SettingKey, Settings, StorageLocation,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::debounce::Debouncer;
use crate::error::{ReaderError, Result};
use crate::fonts::read_font_file;

pub const DEFAULT_SCROLL_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_SETTINGS_DEBOUNCE: Duration = Duration::from_millis(100);

const SCROLL_KEY: &str = "scroll";
const SETTINGS_KEY: &str = "settings";

/// Quiet periods before debounced writes go to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub scroll_debounce: Duration,
    pub settings_debounce: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            scroll_debounce: DEFAULT_SCROLL_DEBOUNCE,
            settings_debounce: DEFAULT_SETTINGS_DEBOUNCE,
        }
    }
}

#[derive(Debug)]
struct OpenNovel {
    novel: Novel,
    chapter_index: usize,
    scroll_position: f64,
}

/// State of one reader: the open novel, the position in it and the
/// typography preferences.
///
/// Navigation saves progress in the background without waiting for it;
/// [`settle`](Self::settle) waits for those saves. Scroll and settings
/// changes are debounced.
pub struct ReaderSession {
    storage: Arc<StorageManager>,
    segmenter: Segmenter,
    options: SessionOptions,
    debouncer: Debouncer,
    open: Option<OpenNovel>,
    settings: Settings,
    font: Option<CustomFont>,
    last_save: Option<JoinHandle<()>>,
}

impl ReaderSession {
    pub fn new(storage: Arc<StorageManager>) -> Self {
        Self {
            storage,
            segmenter: Segmenter::default(),
            options: SessionOptions::default(),
            debouncer: Debouncer::new(),
            open: None,
            settings: Settings::default(),
            font: None,
            last_save: None,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn storage(&self) -> &Arc<StorageManager> {
        &self.storage
    }

    /// Load stored settings and the custom font.
    pub async fn load_preferences(&mut self) {
        self.settings = self.storage.load_settings().await;
        self.font = self.storage.load_font().await;
        debug!(custom_font = self.font.is_some(), "loaded preferences");
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn font(&self) -> Option<&CustomFont> {
        self.font.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn novel(&self) -> Option<&Novel> {
        self.open.as_ref().map(|open| &open.novel)
    }

    pub fn chapters(&self) -> &[Chapter] {
        self.open
            .as_ref()
            .map(|open| open.novel.chapters.as_slice())
            .unwrap_or_default()
    }

    pub fn chapter_index(&self) -> Option<usize> {
        self.open.as_ref().map(|open| open.chapter_index)
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        let open = self.open.as_ref()?;
        open.novel.chapters.get(open.chapter_index)
    }

    pub fn scroll_position(&self) -> f64 {
        self.open.as_ref().map_or(0.0, |open| open.scroll_position)
    }

    pub fn has_next(&self) -> bool {
        self.open
            .as_ref()
            .is_some_and(|open| open.chapter_index + 1 < open.novel.chapters.len())
    }

    pub fn has_prev(&self) -> bool {
        self.open.as_ref().is_some_and(|open| open.chapter_index > 0)
    }

    /// Read, segment and store a `.txt` file, then open it.
    pub async fn open_text_file(&mut self, path: impl AsRef<Path>) -> Result<StorageLocation> {
        let source = read_text_file(path).await?;
        self.open_source(source).await
    }

    /// Segment, store and open text that didn't come from a file on disk.
    pub async fn open_text(&mut self, name: &str, text: &str) -> Result<StorageLocation> {
        let source = TextSource {
            name: name.to_string(),
            size: text.len() as u64,
            last_modified: Utc::now().timestamp_millis(),
            text: text.to_string(),
        };
        self.open_source(source).await
    }

    async fn open_source(&mut self, source: TextSource) -> Result<StorageLocation> {
        let novel = source.into_novel(&self.segmenter)?;
        let location = self.storage.save_novel(&novel).await?;
        self.activate(novel).await;
        Ok(location)
    }

    /// Open a novel that is already in storage, resuming where it was left.
    pub async fn open_stored(&mut self, id: &NovelId) -> Result<()> {
        let novel = self
            .storage
            .load_novel(id)
            .await?
            .ok_or_else(|| ReaderError::NovelNotFound { id: id.clone() })?;
        self.activate(novel).await;
        Ok(())
    }

    async fn activate(&mut self, novel: Novel) {
        if let Err(e) = self.flush().await {
            warn!(error = %e, "failed to save state of previous novel");
        }

        let progress = self.storage.load_progress(&novel.id).await;
        let last = novel.chapters.len().saturating_sub(1);
        let (chapter_index, scroll_position) = progress
            .map(|p| (p.chapter_index.min(last), p.scroll_position))
            .unwrap_or((0, 0.0));

        info!(
            id = %novel.id,
            chapters = novel.chapters.len(),
            chapter_index,
            "opened novel"
        );
        self.open = Some(OpenNovel {
            novel,
            chapter_index,
            scroll_position,
        });
    }

    fn open_mut(&mut self) -> Result<&mut OpenNovel> {
        self.open.as_mut().ok_or(ReaderError::NoOpenNovel)
    }

    /// Go to the next chapter. Returns `false` at the last chapter.
    pub fn next(&mut self) -> Result<bool> {
        let open = self.open_mut()?;
        if open.chapter_index + 1 >= open.novel.chapters.len() {
            return Ok(false);
        }
        open.chapter_index += 1;
        open.scroll_position = 0.0;
        self.save_progress_in_background();
        Ok(true)
    }

    /// Go to the previous chapter. Returns `false` at the first chapter.
    pub fn prev(&mut self) -> Result<bool> {
        let open = self.open_mut()?;
        if open.chapter_index == 0 {
            return Ok(false);
        }
        open.chapter_index -= 1;
        open.scroll_position = 0.0;
        self.save_progress_in_background();
        Ok(true)
    }

    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        let open = self.open_mut()?;
        let count = open.novel.chapters.len();
        if index >= count {
            return Err(ReaderError::ChapterOutOfRange { index, count });
        }
        open.chapter_index = index;
        open.scroll_position = 0.0;
        self.save_progress_in_background();
        Ok(())
    }

    /// Record the scroll offset and save it once scrolling stops.
    pub fn record_scroll(&mut self, position: f64) -> Result<()> {
        self.open_mut()?.scroll_position = position;
        if let Some(save) = self.progress_save() {
            self.debouncer
                .schedule(SCROLL_KEY, self.options.scroll_debounce, save);
        }
        Ok(())
    }

    fn progress_save(&self) -> Option<impl Future<Output = ()> + Send + 'static> {
        let open = self.open.as_ref()?;
        let progress = ReadingProgress::now(
            open.novel.id.clone(),
            open.chapter_index,
            open.scroll_position,
        );
        let storage = Arc::clone(&self.storage);
        Some(async move {
            match storage.save_progress(&progress).await {
                Ok(()) => debug!(
                    id = %progress.novel_id,
                    chapter = progress.chapter_index,
                    "saved reading progress"
                ),
                Err(e) => warn!(id = %progress.novel_id, error = %e, "failed to save reading progress"),
            }
        })
    }

    /// Saves run one after another so an older position never overwrites a newer one.
    fn save_progress_in_background(&mut self) {
        self.debouncer.cancel(SCROLL_KEY);
        let Some(save) = self.progress_save() else {
            return;
        };
        let previous = self.last_save.take();
        let debouncer = self.debouncer.clone();
        self.last_save = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            debouncer.wait_idle(SCROLL_KEY).await;
            save.await;
        }));
    }

    /// Wait for background progress saves started so far.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.last_save.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "progress save task failed");
            }
        }
    }

    /// Write pending scroll and settings changes now.
    pub async fn flush(&mut self) -> Result<()> {
        let scroll_pending = self.debouncer.cancel_and_wait(SCROLL_KEY).await;
        let settings_pending = self.debouncer.cancel_and_wait(SETTINGS_KEY).await;
        self.settle().await;

        if scroll_pending {
            if let Some(open) = &self.open {
                let progress = ReadingProgress::now(
                    open.novel.id.clone(),
                    open.chapter_index,
                    open.scroll_position,
                );
                self.storage.save_progress(&progress).await?;
            }
        }
        if settings_pending {
            self.storage.save_settings(&self.settings).await?;
        }
        Ok(())
    }

    /// Replace the settings and save them once changes stop.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        let storage = Arc::clone(&self.storage);
        let snapshot = self.settings.clone();
        self.debouncer
            .schedule(SETTINGS_KEY, self.options.settings_debounce, async move {
                if let Err(e) = storage.save_settings(&snapshot).await {
                    warn!(error = %e, "failed to save settings");
                }
            });
    }

    /// Parse and apply a single setting, then save it once changes stop.
    pub fn set_setting(&mut self, key: SettingKey, value: &str) -> Result<()> {
        let mut settings = self.settings.clone();
        settings.set(key, value)?;
        self.update_settings(settings);
        Ok(())
    }

    async fn save_settings_now(&mut self) -> Result<()> {
        self.debouncer.cancel_and_wait(SETTINGS_KEY).await;
        self.storage.save_settings(&self.settings).await?;
        Ok(())
    }

    pub async fn reset_text_style(&mut self) -> Result<()> {
        self.settings.reset_text_style();
        self.save_settings_now().await
    }

    pub async fn reset_paragraph_style(&mut self) -> Result<()> {
        self.settings.reset_paragraph_style();
        self.save_settings_now().await
    }

    /// Remove the custom font and fall back to the default one.
    pub async fn reset_font(&mut self) -> Result<()> {
        self.storage.delete_font().await?;
        self.font = None;
        info!("reset custom font");
        Ok(())
    }

    pub async fn reset_all_styles(&mut self) -> Result<()> {
        self.settings = Settings::default();
        self.save_settings_now().await?;
        self.reset_font().await
    }

    /// Store a font file as the custom font.
    pub async fn upload_font(&mut self, path: impl AsRef<Path>) -> Result<&CustomFont> {
        let font = read_font_file(path.as_ref()).await?;
        self.storage.save_font(&font).await?;
        info!(name = %font.name, size = font.size, "uploaded custom font");
        Ok(&*self.font.insert(font))
    }

    /// Save pending changes and close the open novel.
    pub async fn close(&mut self) -> Result<()> {
        let flushed = self.flush().await;
        if let Some(open) = self.open.take() {
            debug!(id = %open.novel.id, "closed novel");
        }
        flushed
    }

    /// Drop pending progress writes and close without saving.
    ///
    /// A scroll save already writing is waited for, so it cannot land after
    /// the caller deletes the progress.
    async fn discard(&mut self) {
        self.debouncer.cancel_and_wait(SCROLL_KEY).await;
        self.settle().await;
        self.open = None;
    }

    /// Delete a stored novel, closing it first if it is the open one.
    pub async fn remove_novel(&mut self, id: &NovelId) -> Result<()> {
        if self.novel().is_some_and(|novel| &novel.id == id) {
            self.discard().await;
        }
        self.storage.delete_novel(id).await?;
        Ok(())
    }

    /// Delete every stored novel and close the open one.
    pub async fn clear_library(&mut self) -> Result<()> {
        self.discard().await;
        self.storage.delete_all_novels().await?;
        Ok(())
    }
}
