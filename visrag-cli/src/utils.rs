//! Common utility functions shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use colored::Colorize;
use tracing::debug;
use visrag_core::{GalleryConfig, HttpImageStore, ImageRecord, Notice, NoticeLevel, UploadFile};

/// Longest description shown in a table row.
const DESCRIPTION_WIDTH: usize = 60;

/// Build the HTTP store for the configured service.
pub fn connect(config: &GalleryConfig) -> Result<Arc<HttpImageStore>> {
    let store = HttpImageStore::from_config(config).context("Invalid configuration")?;
    debug!(base_url = %store.base_url(), "Connected to image store");
    Ok(Arc::new(store))
}

/// Read a file from disk for upload.
pub async fn read_upload(path: &Path) -> Result<UploadFile> {
    UploadFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Format an upload timestamp for display.
pub fn format_uploaded_at(uploaded_at: &NaiveDateTime) -> String {
    uploaded_at.format("%Y-%m-%d %H:%M").to_string()
}

/// Shorten `text` to `width` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// One table row: id, time, filename, description (or a processing marker).
pub fn print_record_row(record: &ImageRecord) {
    let description = if record.is_processing() {
        "processing…".yellow().to_string()
    } else {
        truncate(&record.description, DESCRIPTION_WIDTH)
    };
    let similarity = record
        .similarity_percent()
        .map(|p| format!(" {}", p.cyan()))
        .unwrap_or_default();

    println!(
        "  {:<10} {} {:<28}{} {}",
        record.id.as_str().bold(),
        format_uploaded_at(&record.uploaded_at).dimmed(),
        truncate(&record.filename, 28),
        similarity,
        description
    );
}

/// Full record block for `show`.
pub fn print_record_detail(record: &ImageRecord) {
    println!();
    println!("   {} {}", "Id:".dimmed(), record.id);
    println!("   {} {}", "File:".dimmed(), record.filename);
    println!("   {} {}", "Path:".dimmed(), record.path);
    println!(
        "   {} {}",
        "Uploaded:".dimmed(),
        format_uploaded_at(&record.uploaded_at)
    );
    if let Some(similarity) = record.similarity_percent() {
        println!("   {} {}", "Similarity:".dimmed(), similarity);
    }
    if record.is_processing() {
        println!("   {} {}", "Status:".dimmed(), "Processing".yellow());
    } else {
        println!("   {} {}", "Description:".dimmed(), record.description);
    }
}

/// Print a notice to stderr, colored by level.
pub fn print_notice(notice: &Notice) {
    let title = match notice.level {
        NoticeLevel::Info => notice.title.normal(),
        NoticeLevel::Success => notice.title.green(),
        NoticeLevel::Warning => notice.title.yellow(),
        NoticeLevel::Error => notice.title.red(),
    };
    eprintln!("{}: {}", title.bold(), notice.message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("a red bicycle on a wall", 10), "a red bic…");
        assert_eq!(truncate("vélo rouge", 4), "vél…");
    }

    #[test]
    fn test_format_uploaded_at() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 15))
            .unwrap();
        assert_eq!(format_uploaded_at(&ts), "2024-05-01 09:30");
    }
}
