//! Turning plain-text novels into ordered chapter lists.
//!
//! [`Segmenter`] finds chapter headings line by line using a fixed, ordered set
//! of [`BoundaryRule`]s. [`source`] handles reading `.txt` files and deriving
//! the identity of the resulting [`Novel`](reader_types::Novel).

pub mod error;
pub mod rules;
pub mod segment;
pub mod source;

pub use error::{ParseError, Result};
pub use rules::{BoundaryRule, default_rules};
pub use segment::{FULL_TEXT_TITLE, START_TITLE, Segmenter, segment};
pub use source::{TextSource, derive_novel_id, read_text_file};
