//! Health command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use visrag_core::{GalleryConfig, GalleryError, ImageStore};

use crate::utils::connect;

/// Execute the health command.
pub async fn execute(config: &GalleryConfig, wait: bool) -> Result<()> {
    let store = connect(config)?;

    let result = if wait {
        store.wait_until_healthy(config.health_wait).await
    } else {
        store.health().await
    };
    let health = result.context("Image store service is not available")?;

    if !health.is_ok() {
        return Err(anyhow::Error::new(GalleryError::Transport(format!(
            "service reports status {:?}",
            health.status
        )))
        .context("Image store service is not healthy"));
    }

    println!(
        "{} Image store at {} is healthy",
        "✓".green().bold(),
        store.base_url()
    );
    Ok(())
}
