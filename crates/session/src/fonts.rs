//! Turning an uploaded font file into a storable [`CustomFont`].

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use reader_types::{CustomFont, FONT_ID, FontFormat};
use tracing::debug;

use crate::error::{ReaderError, Result};

fn font_format(path: &Path) -> Result<(FontFormat, String)> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| FontFormat::from_extension(ext).map(|format| (format, ext.to_ascii_uppercase())))
        .ok_or_else(|| ReaderError::UnsupportedFont {
            path: path.to_path_buf(),
        })
}

/// Encode font bytes as a [`CustomFont`] named after `file_name` without its
/// extension.
pub fn encode_font(file_name: &str, bytes: &[u8], uploaded_at: DateTime<Utc>) -> Result<CustomFont> {
    let path = Path::new(file_name);
    let (format, file_type) = font_format(path)?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(CustomFont {
        id: FONT_ID.to_string(),
        name,
        data: STANDARD.encode(bytes),
        format,
        file_type,
        uploaded_at,
        size: bytes.len() as u64,
    })
}

/// Read and encode a `.ttf`, `.otf`, `.woff` or `.woff2` file.
///
/// The extension is checked before the file is opened.
pub async fn read_font_file(path: &Path) -> Result<CustomFont> {
    font_format(path)?;
    let bytes = tokio::fs::read(path).await.map_err(|source| ReaderError::FontIo {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!(name = %file_name, size = bytes.len(), "read font file");
    encode_font(&file_name, &bytes, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_payload_and_format() {
        let font = encode_font("Noto.WOFF2", &[0, 1, 2, 3], Utc::now()).unwrap();
        assert_eq!(font.id, FONT_ID);
        assert_eq!(font.name, "Noto");
        assert_eq!(font.format, FontFormat::Woff2);
        assert_eq!(font.file_type, "WOFF2");
        assert_eq!(font.data, "AAECAw==");
        assert_eq!(font.size, 4);
    }

    #[test]
    fn only_the_last_extension_is_dropped_from_the_name() {
        let font = encode_font("Noto.Serif.ttf", b"x", Utc::now()).unwrap();
        assert_eq!(font.name, "Noto.Serif");
    }

    #[test]
    fn rejects_other_extensions() {
        for name in ["font.eot", "font", "font.ttf.txt"] {
            assert!(matches!(
                encode_font(name, b"x", Utc::now()),
                Err(ReaderError::UnsupportedFont { .. })
            ));
        }
    }

    #[tokio::test]
    async fn unsupported_file_is_not_read() {
        let err = read_font_file(Path::new("/does/not/exist.eot")).await.unwrap_err();
        assert!(matches!(err, ReaderError::UnsupportedFont { .. }));
    }
}
