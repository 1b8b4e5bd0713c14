//! Reading `.txt` sources and turning them into novels.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use once_cell::sync::Lazy;
use reader_types::{Novel, NovelId};
use regex::Regex;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{ParseError, Result};
use crate::segment::Segmenter;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Raw text of a source file along with the metadata its identity is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSource {
    /// File name including extension.
    pub name: String,
    pub size: u64,
    /// Milliseconds since the epoch.
    pub last_modified: i64,
    pub text: String,
}

impl TextSource {
    pub fn id(&self) -> NovelId {
        derive_novel_id(&self.name, self.size, self.last_modified)
    }

    /// Segment the text into a novel.
    ///
    /// Fails with [`ParseError::EmptyFile`] when the text is blank.
    pub fn into_novel(self, segmenter: &Segmenter) -> Result<Novel> {
        if self.text.trim().is_empty() {
            return Err(ParseError::EmptyFile { name: self.name });
        }

        let chapters = segmenter.segment(&self.text);
        info!(name = %self.name, chapters = chapters.len(), "parsed novel");

        Ok(Novel {
            id: self.id(),
            name: self.name,
            chapters,
            size: self.size,
            last_modified: self.last_modified,
        })
    }
}

/// `"<name>_<size>_<last_modified>"` with every whitespace run replaced by `_`.
///
/// Not a content hash: files that agree on all three values share an id.
pub fn derive_novel_id(name: &str, size: u64, last_modified: i64) -> NovelId {
    let raw = format!("{name}_{size}_{last_modified}");
    NovelId::new(WHITESPACE_RUN.replace_all(&raw, "_").into_owned())
}

pub fn has_txt_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

/// Read a `.txt` file as UTF-8, replacing invalid sequences.
pub async fn read_text_file(path: impl AsRef<Path>) -> Result<TextSource> {
    let path = path.as_ref();
    if !has_txt_extension(path) {
        return Err(ParseError::UnsupportedExtension {
            path: path.to_path_buf(),
        });
    }

    let io_error = |source| ParseError::Io {
        path: PathBuf::from(path),
        source,
    };

    let metadata = fs::metadata(path).await.map_err(io_error)?;
    let bytes = fs::read(path).await.map_err(io_error)?;

    let last_modified = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default();

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!(%name, size = metadata.len(), "read text file");

    Ok(TextSource {
        name,
        size: metadata.len(),
        last_modified,
        text: String::from_utf8_lossy(&bytes).into_owned(),
    })
}
