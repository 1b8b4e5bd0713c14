//! Backend implementations of the storage tiers.
//!
//! [`LocalStore`] is the small, synchronous tier. [`MemoryIndexedStore`] and
//! [`FilesystemIndexedStore`] are interchangeable large-capacity tiers.

pub mod filesystem;
pub mod local;
pub mod memory;

mod index;

pub use filesystem::FilesystemIndexedStore;
pub use local::{DEFAULT_SMALL_CAPACITY, LocalStore};
pub use memory::MemoryIndexedStore;
