use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use eyre::Result;
use reader_session::{DEFAULT_SCROLL_DEBOUNCE, DEFAULT_SETTINGS_DEBOUNCE, SessionOptions};
use reader_storage::{DEFAULT_SMALL_CAPACITY, LARGE_NOVEL_THRESHOLD, RoutingPolicy, format_bytes};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String,
    pub small_capacity: u64,
    pub large_threshold: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReaderConfig {
    pub scroll_debounce_ms: u64,
    pub settings_debounce_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ExportConfig {
    pub output_dir: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: get_default_data_dir()
                .join("storage")
                .to_string_lossy()
                .to_string(),
            small_capacity: DEFAULT_SMALL_CAPACITY,
            large_threshold: LARGE_NOVEL_THRESHOLD,
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            scroll_debounce_ms: DEFAULT_SCROLL_DEBOUNCE.as_millis() as u64,
            settings_debounce_ms: DEFAULT_SETTINGS_DEBOUNCE.as_millis() as u64,
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|_| eyre::eyre!("Invalid number for {}: {}", key, value))
}

impl Config {
    pub fn get_config_path() -> PathBuf {
        get_default_config_dir().join("config.json")
    }

    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.path)
    }

    pub fn routing_policy(&self) -> RoutingPolicy {
        RoutingPolicy::new(self.storage.large_threshold)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            scroll_debounce: Duration::from_millis(self.reader.scroll_debounce_ms),
            settings_debounce: Duration::from_millis(self.reader.settings_debounce_ms),
        }
    }

    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()).await
    }

    /// Load the config at `path`, writing the defaults there if it doesn't exist.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to(path).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub async fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["storage", "path"] => {
                if value.trim().is_empty() {
                    return Err(eyre::eyre!("storage.path cannot be empty"));
                }
                self.storage.path = value.to_string();
            }
            ["storage", "small_capacity"] => {
                self.storage.small_capacity = parse_number(key, value)?;
            }
            ["storage", "large_threshold"] => {
                self.storage.large_threshold = parse_number(key, value)?;
            }
            ["reader", "scroll_debounce_ms"] => {
                self.reader.scroll_debounce_ms = parse_number(key, value)?;
            }
            ["reader", "settings_debounce_ms"] => {
                self.reader.settings_debounce_ms = parse_number(key, value)?;
            }
            ["export", "output_dir"] => {
                self.export.output_dir = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        let value = match parts.as_slice() {
            ["storage", "path"] => self.storage.path.clone(),
            ["storage", "small_capacity"] => self.storage.small_capacity.to_string(),
            ["storage", "large_threshold"] => self.storage.large_threshold.to_string(),
            ["reader", "scroll_debounce_ms"] => self.reader.scroll_debounce_ms.to_string(),
            ["reader", "settings_debounce_ms"] => self.reader.settings_debounce_ms.to_string(),
            ["export", "output_dir"] => self.export.output_dir.clone().unwrap_or_default(),
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        };

        Ok(value)
    }

    pub fn show_all(&self) -> String {
        format!(
            "Configuration:\n\
             Storage:\n\
             ├─ path: {}\n\
             ├─ small_capacity: {}\n\
             └─ large_threshold: {}\n\
             Reader:\n\
             ├─ scroll_debounce_ms: {}\n\
             └─ settings_debounce_ms: {}\n\
             Export:\n\
             └─ output_dir: {}",
            self.storage.path,
            self.storage.small_capacity,
            self.storage.large_threshold,
            self.reader.scroll_debounce_ms,
            self.reader.settings_debounce_ms,
            self.export.output_dir.as_deref().unwrap_or("(not set)"),
        )
    }

    /// What the current values mean for routing and debouncing.
    pub fn effective_summary(&self) -> String {
        let policy = self.routing_policy();
        let options = self.session_options();
        format!(
            "  novels over {} go to the large store\n  \
             small store holds up to {}\n  \
             scroll saved after {:?}, settings after {:?} of quiet",
            format_bytes(policy.large_threshold),
            format_bytes(self.storage.small_capacity),
            options.scroll_debounce,
            options.settings_debounce,
        )
    }

    pub async fn reset() -> Result<Self> {
        let config = Self::default();
        config.save().await?;
        Ok(config)
    }
}

/// Get the default configuration directory
fn get_default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("org", "novel-reader", "novel-reader") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        PathBuf::from(".novel-reader").join("config")
    }
}

/// Get the default data directory
pub fn get_default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("org", "novel-reader", "novel-reader") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from(".novel-reader").join("data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_and_get_round_trip() {
        let mut config = Config::default();
        config.set_value("storage.large_threshold", "2048").unwrap();
        config.set_value("reader.scroll_debounce_ms", "250").unwrap();
        config.set_value("export.output_dir", "/tmp/backups").unwrap();

        assert_eq!(config.get_value("storage.large_threshold").unwrap(), "2048");
        assert_eq!(config.routing_policy(), RoutingPolicy::new(2048));
        assert_eq!(
            config.session_options().scroll_debounce,
            Duration::from_millis(250)
        );
        assert_eq!(config.get_value("export.output_dir").unwrap(), "/tmp/backups");

        config.set_value("export.output_dir", "").unwrap();
        assert_eq!(config.export.output_dir, None);
    }

    #[test]
    fn effective_summary_reflects_overrides() {
        let mut config = Config::default();
        config.set_value("storage.large_threshold", "2048").unwrap();
        config.set_value("reader.scroll_debounce_ms", "250").unwrap();

        let summary = config.effective_summary();
        assert!(summary.contains("novels over 2 KB go to the large store"));
        assert!(summary.contains("scroll saved after 250ms, settings after 100ms"));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_numbers() {
        let mut config = Config::default();
        assert!(config.set_value("storage.colour", "blue").is_err());
        assert!(config.get_value("reader").is_err());
        assert!(config.set_value("storage.small_capacity", "lots").is_err());
        assert_eq!(config.storage.small_capacity, DEFAULT_SMALL_CAPACITY);
    }

    #[tokio::test]
    async fn first_load_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let mut changed = config.clone();
        changed.set_value("storage.small_capacity", "1000").unwrap();
        changed.save_to(&path).await.unwrap();
        assert_eq!(Config::load_from(&path).await.unwrap(), changed);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"storage": {"path": "/data/reader"}}"#).unwrap();
        assert_eq!(config.storage.path, "/data/reader");
        assert_eq!(config.storage.large_threshold, LARGE_NOVEL_THRESHOLD);
        assert_eq!(config.reader, ReaderConfig::default());
    }
}
