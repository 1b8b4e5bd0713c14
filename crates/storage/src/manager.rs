//! The storage manager: routes records to a tier and merges what comes back.

use std::collections::HashSet;
use std::sync::Arc;

use reader_types::{
    CustomFont, FONT_ID, Novel, NovelId, NovelSummary, ReadingProgress, Settings, StorageLocation,
};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::backends::{DEFAULT_SMALL_CAPACITY, LocalStore, MemoryIndexedStore};
use crate::error::{Result, StorageError};
use crate::keys::SETTINGS_KEY;
use crate::routing::RoutingPolicy;
use crate::schema::{Collection, SchemaReport, reader_schema};
use crate::traits::{IndexedTier, Tier};
use crate::types::StorageInfo;

/// Facade over the small and the large tier.
///
/// Novels are routed by size on every save; progress and settings stay in
/// the small tier and fonts in the large one. Reads that are only used for
/// display degrade to "nothing found" instead of failing.
pub struct StorageManager {
    small: Arc<dyn Tier>,
    large: Arc<dyn IndexedTier>,
    policy: RoutingPolicy,
}

/// Just enough of a stored novel to build a [`NovelSummary`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NovelHeader {
    id: NovelId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    last_modified: i64,
    #[serde(default)]
    chapters: Vec<IgnoredAny>,
}

impl NovelHeader {
    fn into_summary(self, location: StorageLocation) -> NovelSummary {
        NovelSummary {
            id: self.id,
            name: self.name,
            size: self.size,
            last_modified: self.last_modified,
            chapter_count: self.chapters.len(),
            location,
            last_read: None,
        }
    }
}

/// Treat an uninitialized large tier as empty.
pub(crate) fn skip_unavailable<T: Default>(result: Result<T>) -> Result<T> {
    match result {
        Err(e) if e.is_unavailable() => {
            debug!(error = %e, "large store unavailable, skipping");
            Ok(T::default())
        }
        other => other,
    }
}

fn validate_novel(novel: &Novel) -> Result<()> {
    let message = if novel.id.as_str().trim().is_empty() {
        "novel id cannot be empty"
    } else if novel.name.trim().is_empty() {
        "novel name cannot be empty"
    } else if novel.chapters.is_empty() {
        "novel has no chapters"
    } else {
        return Ok(());
    };
    Err(StorageError::InvalidNovelData {
        message: message.to_string(),
        source: None,
    })
}

fn to_value<T: serde::Serialize>(value: &T, what: &str) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| StorageError::conversion(format!("Failed to serialize {what}"), e))
}

impl StorageManager {
    pub fn new(small: Arc<dyn Tier>, large: Arc<dyn IndexedTier>) -> Self {
        Self {
            small,
            large,
            policy: RoutingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RoutingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build a manager and initialize the large tier.
    ///
    /// Initialization failure is logged, not returned: the manager stays
    /// usable and the large tier reports itself unavailable.
    pub async fn open(small: Arc<dyn Tier>, large: Arc<dyn IndexedTier>) -> Self {
        let manager = Self::new(small, large);
        if let Err(e) = manager.initialize().await {
            warn!(error = %e, "failed to initialize large store, continuing with small store only");
        }
        manager
    }

    /// A manager over two in-memory tiers.
    pub async fn in_memory() -> Self {
        Self::open(
            Arc::new(LocalStore::in_memory(DEFAULT_SMALL_CAPACITY)),
            Arc::new(MemoryIndexedStore::new()),
        )
        .await
    }

    /// Create or upgrade the large tier's schema.
    pub async fn initialize(&self) -> Result<SchemaReport> {
        let report = self.large.initialize(&reader_schema()).await?;
        if !report.is_unchanged() {
            info!(
                from = report.previous_version,
                to = report.version,
                "upgraded large store schema"
            );
        }
        Ok(report)
    }

    pub fn policy(&self) -> RoutingPolicy {
        self.policy
    }

    fn tier(&self, location: StorageLocation) -> &dyn Tier {
        match location {
            StorageLocation::SmallStore => self.small.as_ref(),
            StorageLocation::LargeStore => self.large.as_tier(),
        }
    }

    fn fixed_tier(&self, collection: Collection) -> &dyn Tier {
        self.tier(
            self.policy
                .fixed_location(collection)
                .unwrap_or(StorageLocation::SmallStore),
        )
    }

    /// Read and decode a single record, logging instead of failing.
    async fn read_or_warn<T: DeserializeOwned>(
        tier: &dyn Tier,
        collection: Collection,
        key: &str,
    ) -> Option<T> {
        match tier.get(collection, key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%collection, key, error = %e, "ignoring malformed record");
                    None
                }
            },
            Ok(None) => None,
            Err(e) if e.is_unavailable() => None,
            Err(e) => {
                warn!(%collection, key, error = %e, "failed to read record");
                None
            }
        }
    }

    /// Save a novel to the tier its size calls for.
    ///
    /// A copy left in the other tier by an earlier save is removed afterwards,
    /// so a novel is never listed twice.
    pub async fn save_novel(&self, novel: &Novel) -> Result<StorageLocation> {
        validate_novel(novel)?;
        let (location, size) = self.policy.location_for_novel(novel)?;
        let value = to_value(novel, "novel")?;
        let key = novel.id.as_str();

        if let Err(e) = self.tier(location).put(Collection::Novels, key, &value).await {
            error!(id = %novel.id, %location, error = %e, "failed to save novel");
            return Err(e);
        }
        debug!(id = %novel.id, %location, size, "saved novel");

        let stale = location.other();
        match self.tier(stale).delete(Collection::Novels, key).await {
            Ok(true) => info!(id = %novel.id, from = %stale, to = %location, "moved novel between tiers"),
            Ok(false) => {}
            Err(e) if e.is_unavailable() => {}
            Err(e) => warn!(id = %novel.id, tier = %stale, error = %e, "failed to remove stale copy of novel"),
        }
        Ok(location)
    }

    /// Load a novel, looking in the small tier first.
    pub async fn load_novel(&self, id: &NovelId) -> Result<Option<Novel>> {
        let key = id.as_str();
        match self.small.get(Collection::Novels, key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(novel) => return Ok(Some(novel)),
                Err(e) => warn!(%id, error = %e, "ignoring malformed novel in small store"),
            },
            Ok(None) => {}
            Err(e) => warn!(%id, error = %e, "failed to read novel from small store"),
        }

        match self.large.get(Collection::Novels, key).await {
            Ok(Some(value)) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::conversion(format!("Malformed novel {id}"), e)),
            Ok(None) => Ok(None),
            Err(e) if e.is_unavailable() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn summaries(tier: &dyn Tier) -> Vec<NovelSummary> {
        let location = tier.location();
        let values = match tier.list_all(Collection::Novels).await {
            Ok(values) => values,
            Err(e) if e.is_unavailable() => Vec::new(),
            Err(e) => {
                warn!(tier = %location, error = %e, "failed to list novels");
                Vec::new()
            }
        };

        values
            .iter()
            .filter_map(|value| match NovelHeader::deserialize(value) {
                Ok(header) if !header.name.is_empty() => Some(header.into_summary(location)),
                Ok(header) => {
                    debug!(id = %header.id, "skipping novel without a name");
                    None
                }
                Err(e) => {
                    warn!(tier = %location, error = %e, "skipping malformed novel");
                    None
                }
            })
            .collect()
    }

    /// Every stored novel, most recently read first.
    ///
    /// Novels never opened sort last. If a novel somehow exists in both
    /// tiers, the small tier's copy wins.
    pub async fn list_all_novels(&self) -> Vec<NovelSummary> {
        let (small, large) = tokio::join!(
            Self::summaries(self.small.as_ref()),
            Self::summaries(self.large.as_tier()),
        );

        let mut seen = HashSet::new();
        let mut novels: Vec<NovelSummary> = small
            .into_iter()
            .chain(large)
            .filter(|summary| seen.insert(summary.id.clone()))
            .collect();

        for novel in &mut novels {
            novel.last_read = self.load_progress(&novel.id).await.map(|p| p.last_read);
        }
        // `None` orders before `Some`, so a descending sort puts unread novels last.
        novels.sort_by(|a, b| b.last_read.cmp(&a.last_read));
        novels
    }

    /// The `limit` most recently read novels.
    pub async fn recent_novels(&self, limit: usize) -> Vec<NovelSummary> {
        let mut novels = self.list_all_novels().await;
        novels.truncate(limit);
        novels
    }

    pub async fn save_progress(&self, progress: &ReadingProgress) -> Result<()> {
        let value = to_value(progress, "reading progress")?;
        self.fixed_tier(Collection::Progress)
            .put(Collection::Progress, progress.novel_id.as_str(), &value)
            .await
    }

    pub async fn load_progress(&self, id: &NovelId) -> Option<ReadingProgress> {
        Self::read_or_warn(
            self.fixed_tier(Collection::Progress),
            Collection::Progress,
            id.as_str(),
        )
        .await
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let value = to_value(settings, "settings")?;
        self.fixed_tier(Collection::Settings)
            .put(Collection::Settings, SETTINGS_KEY, &value)
            .await
    }

    /// Stored settings, or the defaults if none are stored or they can't be read.
    pub async fn load_settings(&self) -> Settings {
        Self::read_or_warn(
            self.fixed_tier(Collection::Settings),
            Collection::Settings,
            SETTINGS_KEY,
        )
        .await
        .unwrap_or_default()
    }

    /// Store the custom font, replacing any earlier one.
    pub async fn save_font(&self, font: &CustomFont) -> Result<()> {
        let mut value = to_value(font, "font")?;
        if let Some(fields) = value.as_object_mut() {
            fields.insert("id".to_string(), Value::from(FONT_ID));
        }
        self.fixed_tier(Collection::Fonts)
            .put(Collection::Fonts, FONT_ID, &value)
            .await?;
        debug!(name = %font.name, size = font.size, "saved custom font");
        Ok(())
    }

    pub async fn load_font(&self) -> Option<CustomFont> {
        Self::read_or_warn(self.fixed_tier(Collection::Fonts), Collection::Fonts, FONT_ID).await
    }

    pub async fn delete_font(&self) -> Result<()> {
        skip_unavailable(self.fixed_tier(Collection::Fonts).clear(Collection::Fonts).await)
    }

    /// Delete a novel and its reading progress from both tiers.
    pub async fn delete_novel(&self, id: &NovelId) -> Result<()> {
        let key = id.as_str();
        self.small.delete(Collection::Novels, key).await?;
        self.small.delete(Collection::Progress, key).await?;
        skip_unavailable(self.large.delete(Collection::Novels, key).await)?;
        skip_unavailable(self.large.delete(Collection::Progress, key).await)?;
        info!(%id, "deleted novel");
        Ok(())
    }

    /// Delete every novel and all reading progress.
    pub async fn delete_all_novels(&self) -> Result<()> {
        self.small.clear(Collection::Novels).await?;
        self.small.clear(Collection::Progress).await?;
        skip_unavailable(self.large.clear(Collection::Novels).await)?;
        skip_unavailable(self.large.clear(Collection::Progress).await)?;
        info!("deleted all novels");
        Ok(())
    }

    /// Delete stored settings and the custom font.
    pub async fn delete_all_settings(&self) -> Result<()> {
        self.small.delete(Collection::Settings, SETTINGS_KEY).await?;
        skip_unavailable(self.large.clear(Collection::Settings).await)?;
        self.delete_font().await?;
        info!("deleted all settings");
        Ok(())
    }

    /// Usage across both tiers. Zeros if the small tier can't be measured.
    pub async fn storage_info(&self) -> StorageInfo {
        match self.try_storage_info().await {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "failed to measure storage usage");
                StorageInfo::default()
            }
        }
    }

    async fn try_storage_info(&self) -> Result<StorageInfo> {
        let small = self.small.usage().await?.unwrap_or(0);
        let items = self.small.entry_count().await?;
        let large = match self.large.usage().await {
            Ok(usage) => usage.unwrap_or(0),
            Err(e) => {
                debug!(error = %e, "large store usage unknown");
                0
            }
        };
        Ok(StorageInfo::new(small + large, items))
    }

    pub(crate) fn small_tier(&self) -> &dyn Tier {
        self.small.as_ref()
    }

    pub(crate) fn large_tier(&self) -> &dyn Tier {
        self.large.as_tier()
    }
}
