//! Subcommand implementations.

pub mod health;
pub mod list;
pub mod search;
pub mod show;
pub mod upload;
pub mod watch;

use anyhow::Result;
use visrag_core::{GalleryError, RefreshOutcome};

/// Turn a failed initial load into an error the exit code logic understands.
pub(crate) fn ensure_loaded(outcome: RefreshOutcome) -> Result<()> {
    match outcome {
        RefreshOutcome::Failed { message } => {
            Err(anyhow::Error::new(GalleryError::Transport(message)).context("Failed to load images"))
        }
        _ => Ok(()),
    }
}
