//! Library command handlers for browsing and maintaining stored novels.

use chrono::{DateTime, Local, Utc};
use eyre::Result;
use reader_session::ReaderSession;
use reader_storage::format_bytes;
use reader_types::{NovelId, NovelSummary};
use tracing::info;

use super::confirm;
use crate::cli::LibraryCommands;

pub async fn handle_library_command(
    cmd: LibraryCommands,
    session: &mut ReaderSession,
    dry_run: bool,
) -> Result<()> {
    match cmd {
        LibraryCommands::List { limit } => handle_list_novels(limit, session).await,
        LibraryCommands::Show { novel_id } => handle_show_novel(novel_id, session).await,
        LibraryCommands::Remove { novel_id, force } => {
            handle_remove_novel(novel_id, force, session, dry_run).await
        }
        LibraryCommands::Clear { force } => handle_clear_library(force, session, dry_run).await,
    }
}

pub(crate) fn format_last_read(last_read: Option<DateTime<Utc>>) -> String {
    match last_read {
        Some(at) => at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "never".to_string(),
    }
}

fn print_summary(novel: &NovelSummary) {
    println!("{}", novel.name);
    println!("  id: {}", novel.id);
    println!(
        "  {} chapters, {}, stored in {}",
        novel.chapter_count,
        format_bytes(novel.size),
        novel.location
    );
    println!("  last read: {}", format_last_read(novel.last_read));
}

async fn handle_list_novels(limit: Option<usize>, session: &ReaderSession) -> Result<()> {
    let novels = match limit {
        Some(limit) => session.storage().recent_novels(limit).await,
        None => session.storage().list_all_novels().await,
    };

    if novels.is_empty() {
        println!("No novels in library");
        println!("💡 Use 'novel-reader open <file.txt>' to add one");
    } else {
        println!("Library ({} novels):", novels.len());
        for novel in &novels {
            print_summary(novel);
        }
    }
    Ok(())
}

async fn handle_show_novel(novel_id: String, session: &ReaderSession) -> Result<()> {
    let id = NovelId::from(novel_id);
    let Some(novel) = session.storage().load_novel(&id).await? else {
        println!("Novel not found: {}", id);
        return Ok(());
    };
    let progress = session.storage().load_progress(&id).await;

    println!("📖 {}", novel.name);
    println!("id: {}", novel.id);
    println!("size: {}", format_bytes(novel.size));
    println!(
        "last read: {}",
        format_last_read(progress.as_ref().map(|p| p.last_read))
    );
    println!("Chapters ({}):", novel.chapters.len());
    let current = progress.map(|p| p.chapter_index);
    for (index, chapter) in novel.chapters.iter().enumerate() {
        let marker = if current == Some(index) { ">" } else { " " };
        println!("{} {:>4}. {}", marker, index + 1, chapter.title);
    }
    Ok(())
}

async fn handle_remove_novel(
    novel_id: String,
    force: bool,
    session: &mut ReaderSession,
    dry_run: bool,
) -> Result<()> {
    let id = NovelId::from(novel_id);
    let Some(novel) = session.storage().load_novel(&id).await? else {
        println!("Novel not found: {}", id);
        return Ok(());
    };

    if dry_run {
        println!("Would remove novel: {} ({})", novel.name, id);
        return Ok(());
    }

    if !force && !confirm(&format!("Remove '{}' and its reading progress?", novel.name))? {
        println!("❌ Cancelled");
        return Ok(());
    }

    session.remove_novel(&id).await?;
    info!(%id, "removed novel");
    println!("✅ Removed {}", novel.name);
    Ok(())
}

async fn handle_clear_library(force: bool, session: &mut ReaderSession, dry_run: bool) -> Result<()> {
    let count = session.storage().list_all_novels().await.len();
    if count == 0 {
        println!("No novels in library");
        return Ok(());
    }

    if dry_run {
        println!("Would remove {} novels", count);
        return Ok(());
    }

    if !force && !confirm(&format!("Remove all {} novels and their reading progress?", count))? {
        println!("❌ Cancelled");
        return Ok(());
    }

    session.clear_library().await?;
    println!("✅ Removed {} novels", count);
    Ok(())
}
