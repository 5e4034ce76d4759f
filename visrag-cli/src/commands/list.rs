//! List command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use visrag_core::{GalleryConfig, ListSurface};

use super::ensure_loaded;
use crate::utils::{connect, print_record_row};
use crate::OutputFormat;

/// Execute the list command.
pub async fn execute(config: &GalleryConfig, format: OutputFormat) -> Result<()> {
    let store = connect(config)?;
    let (surface, _events, outcome) = ListSurface::open_list(store, config).await;
    ensure_loaded(outcome)?;

    let view = surface.snapshot();
    surface.dispose();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&view.records())
                .context("Failed to serialize images")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            if view.is_empty() {
                println!("{}", "No images uploaded yet.".dimmed());
                return Ok(());
            }
            println!();
            for record in view.records() {
                print_record_row(record);
            }
            println!();
            if let Some(banner) = view.pending_banner() {
                println!("   {}", banner.yellow());
            }
            println!("   {} {}", "Total:".dimmed(), view.len());
        }
    }
    Ok(())
}
