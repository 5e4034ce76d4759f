//! Upload command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use tracing::info;
use visrag_core::{GalleryConfig, ListSurface, SurfaceEvent};

use super::ensure_loaded;
use super::watch::follow;
use crate::utils::{connect, print_notice, print_record_row, read_upload};

/// Execute the upload command.
pub async fn execute(
    config: &GalleryConfig,
    paths: Vec<PathBuf>,
    no_wait: bool,
    timeout: Option<u64>,
) -> Result<()> {
    // Read everything up front so a missing file sends nothing
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let file = read_upload(path).await?;
        info!(path = %path.display(), bytes = file.bytes.len(), "Read file");
        files.push(file);
    }

    let store = connect(config)?;
    let (surface, mut events, outcome) = ListSurface::open_list(store, config).await;
    ensure_loaded(outcome)?;

    let report = surface.upload(files).await;

    println!();
    for record in &report.uploaded {
        print_record_row(record);
    }
    println!();

    if let Some(error) = report.failure_error() {
        if !report.not_attempted.is_empty() {
            eprintln!(
                "   {} {}",
                "Not uploaded:".dimmed(),
                report.not_attempted.join(", ")
            );
        }
        surface.dispose();
        return Err(error.into());
    }

    if no_wait || !config.auto_refresh {
        while let Some(event) = events.try_next() {
            if let SurfaceEvent::Notice(notice) = event {
                print_notice(&notice);
            }
        }
        surface.dispose();
        return Ok(());
    }

    if let Some(banner) = surface.snapshot().pending_banner() {
        println!("{}", banner.yellow());
    }
    follow(&surface, &mut events, timeout.map(Duration::from_secs)).await?;
    Ok(())
}
