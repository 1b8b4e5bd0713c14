//! Tiered persistence for the novel reader.
//!
//! Two backing tiers sit behind the same [`Tier`] contract: a small,
//! synchronous, capacity-limited store ([`LocalStore`]) and a larger,
//! asynchronous, schema-based store ([`MemoryIndexedStore`] or
//! [`FilesystemIndexedStore`]). [`StorageManager`] decides which tier each
//! record goes to, merges listings from both and handles backup export and
//! import.

pub mod backends;
pub mod backup;
pub mod error;
pub mod format;
pub mod keys;
pub mod manager;
pub mod routing;
pub mod schema;
pub mod size;
pub mod traits;
pub mod types;

pub use backends::{DEFAULT_SMALL_CAPACITY, FilesystemIndexedStore, LocalStore, MemoryIndexedStore};
pub use backup::{BACKUP_VERSION, Backup, BackupNovel, backup_file_name};
pub use error::{Result, StorageError};
pub use format::format_bytes;
pub use manager::StorageManager;
pub use routing::{LARGE_NOVEL_THRESHOLD, RoutingPolicy};
pub use schema::{Collection, CollectionSchema, IndexSchema, Schema, SchemaReport, reader_schema};
pub use size::serialized_size;
pub use traits::{IndexedTier, Tier};
pub use types::StorageInfo;
