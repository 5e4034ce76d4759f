//! Watch command implementation.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::info;
use visrag_core::{GalleryConfig, ListSurface, Surface, SurfaceEvent, SurfaceEvents, SurfaceView};

use super::ensure_loaded;
use crate::utils::{connect, print_notice};

/// Print events until nothing on `surface` is processing, the deadline
/// passes, or the user interrupts. Returns the number of completions seen.
pub(crate) async fn follow<V: SurfaceView>(
    surface: &Surface<V>,
    events: &mut SurfaceEvents,
    timeout: Option<Duration>,
) -> Result<usize> {
    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut completed = 0;
    while surface.is_processing() {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => completed += print_event(event),
                None => break,
            },
            _ = &mut deadline => {
                surface.dispose();
                bail!(
                    "Timed out after {}s with images still processing",
                    timeout.map(|t| t.as_secs()).unwrap_or_default()
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break;
            }
        }
    }

    // Completions are queued before the view reports idle
    while let Some(event) = events.try_next() {
        completed += print_event(event);
    }
    surface.dispose();
    Ok(completed)
}

fn print_event(event: SurfaceEvent) -> usize {
    match event {
        SurfaceEvent::Completed(record) => {
            println!(
                "{} {} {}",
                "✓".green().bold(),
                record.filename.bold(),
                record.description
            );
            1
        }
        SurfaceEvent::Notice(notice) => {
            print_notice(&notice);
            0
        }
    }
}

/// Execute the watch command.
pub async fn execute(config: &GalleryConfig, timeout: Option<u64>) -> Result<()> {
    let store = connect(config)?;
    store
        .wait_until_healthy(config.health_wait)
        .await
        .context("Image store service is not available")?;

    let (surface, mut events, outcome) = ListSurface::open_list(store, config).await;
    ensure_loaded(outcome)?;

    let view = surface.snapshot();
    let Some(banner) = view.pending_banner() else {
        println!("{}", "Nothing is processing.".dimmed());
        return Ok(());
    };
    if !config.auto_refresh {
        println!("{} (auto-refresh is off)", banner.yellow());
        return Ok(());
    }

    println!("{}", banner.yellow());
    let completed = follow(&surface, &mut events, timeout.map(Duration::from_secs)).await?;
    println!();
    println!("   {} {}", "Completed:".dimmed(), completed);
    Ok(())
}
