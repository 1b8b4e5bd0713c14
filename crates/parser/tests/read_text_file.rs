use std::fs;

use reader_parser::{ParseError, Segmenter, read_text_file};
use tempfile::TempDir;

#[tokio::test]
async fn reads_and_segments_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("story.txt");
    fs::write(&path, "Intro\r\n第一章 起\r\n正文一\r\n第二章 承\r\n正文二\r\n").unwrap();

    let source = read_text_file(&path).await.unwrap();
    assert_eq!(source.name, "story.txt");
    assert_eq!(source.size, fs::metadata(&path).unwrap().len());
    assert!(source.last_modified > 0);

    let novel = source.into_novel(&Segmenter::default()).unwrap();
    let titles: Vec<_> = novel.chapters.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["Start", "第一章 起", "第二章 承"]);
    assert_eq!(novel.chapters[2].content, "正文二");
}

#[tokio::test]
async fn rejects_other_extensions_before_reading() {
    let err = read_text_file("/definitely/missing/book.md")
        .await
        .unwrap_err();
    assert!(matches!(err, ParseError::UnsupportedExtension { .. }));
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = read_text_file(temp_dir.path().join("missing.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
}

#[tokio::test]
async fn invalid_utf8_is_replaced() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bytes.TXT");
    fs::write(&path, b"Chapter 1\nok \xff\xfe end").unwrap();

    let source = read_text_file(&path).await.unwrap();
    assert!(source.text.contains('\u{FFFD}'));
}
