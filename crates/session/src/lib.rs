//! Reader session state for the novel reader.
//!
//! [`ReaderSession`] ties the parser and the storage manager together: it
//! opens novels, tracks the current chapter and scroll offset, and persists
//! progress and typography settings in the background.

pub mod debounce;
pub mod error;
pub mod fonts;
pub mod session;

pub use debounce::Debouncer;
pub use error::{ReaderError, Result};
pub use fonts::{encode_font, read_font_file};
pub use session::{
    DEFAULT_SCROLL_DEBOUNCE, DEFAULT_SETTINGS_DEBOUNCE, ReaderSession, SessionOptions,
};
