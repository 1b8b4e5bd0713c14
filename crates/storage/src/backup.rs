//! Backup bundles: export everything to one JSON document and read it back.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use reader_types::{CustomFont, Novel, Settings, StorageLocation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, StorageError};
use crate::manager::{StorageManager, skip_unavailable};
use crate::schema::Collection;

/// The only bundle version this build writes and accepts.
pub const BACKUP_VERSION: &str = "1.0";

/// A full export of novels, settings and the custom font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub novels: Vec<BackupNovel>,
    pub settings: Settings,
    pub fonts: Vec<CustomFont>,
}

/// A novel together with the tier it was exported from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupNovel {
    #[serde(flatten)]
    pub novel: Novel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<StorageLocation>,
}

/// File name used for a backup taken on `date`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("novel-reader-backup-{}.json", date.format("%Y-%m-%d"))
}

impl Backup {
    pub fn file_name(&self) -> String {
        backup_file_name(self.export_date.date_naive())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StorageError::conversion("Failed to serialize backup", e))
    }
}

fn format_error(message: impl Into<String>, source: Option<serde_json::Error>) -> StorageError {
    StorageError::Format {
        message: message.into(),
        source: source.map(eyre::Report::new),
    }
}

impl StorageManager {
    async fn export_tier(tier: &dyn crate::Tier) -> Result<Vec<BackupNovel>> {
        let location = tier.location();
        let values = skip_unavailable(tier.list_all(Collection::Novels).await)?;
        Ok(values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Novel>(value) {
                Ok(novel) => Some(BackupNovel {
                    novel,
                    storage_type: Some(location),
                }),
                Err(e) => {
                    warn!(tier = %location, error = %e, "leaving malformed novel out of backup");
                    None
                }
            })
            .collect())
    }

    /// Collect every novel, the settings and the custom font into a bundle.
    pub async fn export_all(&self) -> Result<Backup> {
        let mut novels = Self::export_tier(self.small_tier()).await?;
        novels.extend(Self::export_tier(self.large_tier()).await?);

        let backup = Backup {
            version: BACKUP_VERSION.to_string(),
            export_date: Utc::now(),
            novels,
            settings: self.load_settings().await,
            fonts: self.load_font().await.into_iter().collect(),
        };
        info!(
            novels = backup.novels.len(),
            fonts = backup.fonts.len(),
            "exported backup"
        );
        Ok(backup)
    }

    /// Export into `dir` under the dated backup file name.
    pub async fn export_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let backup = self.export_all().await?;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(backup.file_name());
        tokio::fs::write(&path, backup.to_json_pretty()?).await?;
        info!(path = %path.display(), "wrote backup file");
        Ok(path)
    }

    /// Restore a bundle and return how many novels were imported.
    ///
    /// The version and the settings are checked before anything is written.
    /// Novels that fail to decode or save are skipped; the rest are routed by
    /// size like any other save.
    pub async fn import(&self, bundle: &Value) -> Result<usize> {
        let version = bundle.get("version").and_then(Value::as_str);
        if version != Some(BACKUP_VERSION) {
            return Err(format_error(
                format!(
                    "expected version {BACKUP_VERSION}, found {}",
                    version.unwrap_or("none")
                ),
                None,
            ));
        }

        let settings = match bundle.get("settings").filter(|v| !v.is_null()) {
            Some(value) => Some(
                Settings::deserialize(value)
                    .map_err(|e| format_error("settings are malformed", Some(e)))?,
            ),
            None => None,
        };

        let mut imported = 0;
        let entries = bundle.get("novels").and_then(Value::as_array);
        for (position, entry) in entries.into_iter().flatten().enumerate() {
            let novel = match Novel::deserialize(entry) {
                Ok(novel) => novel,
                Err(e) => {
                    warn!(position, error = %e, "skipping malformed novel during import");
                    continue;
                }
            };
            match self.save_novel(&novel).await {
                Ok(location) => {
                    imported += 1;
                    debug!(id = %novel.id, %location, "imported novel");
                }
                Err(e) => warn!(id = %novel.id, error = %e, "failed to import novel"),
            }
        }

        if let Some(settings) = settings {
            self.save_settings(&settings).await?;
        }

        let fonts = bundle.get("fonts").and_then(Value::as_array);
        for entry in fonts.into_iter().flatten() {
            match CustomFont::deserialize(entry) {
                Ok(font) => {
                    if let Err(e) = self.save_font(&font).await {
                        warn!(error = %e, "failed to import font");
                    }
                }
                Err(e) => warn!(error = %e, "skipping malformed font during import"),
            }
        }

        info!(imported, "imported backup");
        Ok(imported)
    }

    pub async fn import_json(&self, content: &str) -> Result<usize> {
        let bundle: Value = serde_json::from_str(content)
            .map_err(|e| format_error("backup is not valid JSON", Some(e)))?;
        self.import(&bundle).await
    }

    /// Import a backup file. Only `.json` files are accepted.
    pub async fn import_file(&self, path: &Path) -> Result<usize> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json {
            return Err(StorageError::UnsupportedFile {
                path: path.to_path_buf(),
            });
        }
        let content = tokio::fs::read_to_string(path).await?;
        self.import_json(&content).await
    }
}
