//! Show command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use visrag_core::{DetailSurface, GalleryConfig, ImageId, ImageStore};

use super::watch::follow;
use crate::utils::{connect, print_record_detail};

/// Execute the show command.
pub async fn execute(config: &GalleryConfig, id: String, no_wait: bool) -> Result<()> {
    let store = connect(config)?;
    let id = ImageId::new(id);

    let images = store
        .list_images()
        .await
        .context("Failed to load images")?;
    let record = images
        .into_iter()
        .rev()
        .find(|r| r.id == id)
        .with_context(|| format!("Image {id} not found"))?;

    if !record.is_processing() || no_wait || !config.auto_refresh {
        print_record_detail(&record);
        return Ok(());
    }

    println!("{}", "Waiting for description...".yellow());
    let (surface, mut events) = DetailSurface::open_detail(store, record, config);
    follow(&surface, &mut events, None).await?;
    print_record_detail(surface.snapshot().record());
    Ok(())
}
