//! Search command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use visrag_core::{GalleryConfig, SearchSession};

use crate::utils::{connect, print_record_row};
use crate::OutputFormat;

/// Execute the search command.
pub async fn execute(config: &GalleryConfig, query: String, format: OutputFormat) -> Result<()> {
    let store = connect(config)?;
    let mut session = SearchSession::new(store, config.search_history_len);

    let results = session.search(&query).await.context("Search failed")?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&results.hits)
                .context("Failed to serialize search results")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            if results.is_empty() {
                println!("{}", "No matching images.".dimmed());
                return Ok(());
            }
            println!();
            println!("   {} {}", "Query:".dimmed(), results.query);
            println!();
            for hit in &results.hits {
                print_record_row(hit);
            }
            println!();
        }
    }
    Ok(())
}
