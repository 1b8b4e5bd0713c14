//! Opening text files and reading stored novels.

use std::path::PathBuf;

use eyre::{Result, WrapErr};
use reader_parser::{Segmenter, read_text_file};
use reader_session::ReaderSession;
use reader_types::NovelId;

pub async fn handle_open_command(
    file: PathBuf,
    preview: bool,
    session: &mut ReaderSession,
) -> Result<()> {
    if preview {
        return handle_preview(file).await;
    }

    let location = session
        .open_text_file(&file)
        .await
        .wrap_err_with(|| format!("Failed to open {}", file.display()))?;

    if let Some(novel) = session.novel() {
        println!("✅ Added {} ({} chapters)", novel.name, novel.chapters.len());
        println!("id: {}", novel.id);
        println!("stored in {}", location);
        println!("💡 Use 'novel-reader read {}' to start reading", novel.id);
    }
    Ok(())
}

async fn handle_preview(file: PathBuf) -> Result<()> {
    let source = read_text_file(&file)
        .await
        .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    let segmenter = Segmenter::default();
    let chapters = segmenter.segment(&source.text);

    let rules: Vec<&str> = segmenter.rules().iter().map(|rule| rule.name()).collect();
    println!("Heading rules, in order: {}", rules.join(", "));
    println!("{} would be split into {} chapters:", source.name, chapters.len());
    for (index, chapter) in chapters.iter().enumerate() {
        let rule = segmenter
            .matching_rule(&chapter.title)
            .map(|rule| rule.name())
            .unwrap_or("-");
        println!(
            "{:>4}. {} [{}] ({} chars)",
            index + 1,
            chapter.title,
            rule,
            chapter.content.chars().count()
        );
    }
    Ok(())
}

pub async fn handle_read_command(
    novel_id: String,
    chapter: Option<usize>,
    next: bool,
    prev: bool,
    session: &mut ReaderSession,
) -> Result<()> {
    let id = NovelId::from(novel_id);
    session.open_stored(&id).await?;

    if let Some(number) = chapter {
        let index = number
            .checked_sub(1)
            .ok_or_else(|| eyre::eyre!("Chapter numbers start at 1"))?;
        session.jump_to(index)?;
    } else if next && !session.next()? {
        println!("Already at the last chapter");
    } else if prev && !session.prev()? {
        println!("Already at the first chapter");
    }
    session.settle().await;

    let total = session.chapters().len();
    let (Some(index), Some(current)) = (session.chapter_index(), session.current_chapter()) else {
        return Ok(());
    };

    println!("📖 {} - {}/{}", current.title, index + 1, total);
    println!("{}", "=".repeat(50));
    println!("{}", current.content);
    println!("{}", "=".repeat(50));
    if session.has_next() {
        println!("💡 Use 'novel-reader read {} --next' to continue", id);
    }
    if session.has_prev() {
        println!("💡 Use 'novel-reader read {} --prev' to go back", id);
    }
    Ok(())
}
