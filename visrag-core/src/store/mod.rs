//! Image Store Service contract.
//!
//! The service owns every record and its annotation; this crate only reads
//! snapshots from it and pushes uploads to it. Every response is treated as
//! an independent, possibly stale view.
//!
//! ## Implementations
//!
//! - **HTTP** - the REST service (`GET /api/images`, `POST /api/upload`,
//!   `POST /api/search`, `GET /api/health`)
//! - **Mock** - scriptable in-memory service for tests and demos
//!
//! ## Quick Start
//!
//! ```no_run
//! use visrag_core::store::{HttpImageStore, ImageStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = HttpImageStore::new("http://localhost:8000", std::time::Duration::from_secs(30))?;
//! let images = store.list_images().await?;
//! println!("{} images", images.len());
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "network")]
mod http;
mod mock;

#[cfg(feature = "network")]
pub use http::HttpImageStore;
pub use mock::MockImageStore;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::ImageRecord;

/// Operations the gallery consumes from the Image Store Service.
///
/// Implementations must be thread-safe (`Send + Sync`); surfaces share one
/// store through an `Arc`.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Full snapshot of every listed image. No pagination.
    async fn list_images(&self) -> Result<Vec<ImageRecord>>;

    /// Upload one file. The returned record may still be processing.
    async fn upload_image(&self, file: UploadFile) -> Result<ImageRecord>;

    /// Semantic search. Results carry `similarity` and arrive in relevance
    /// order, which callers preserve.
    async fn search(&self, query: &str) -> Result<Vec<ImageRecord>>;

    /// Liveness probe.
    async fn health(&self) -> Result<ServiceHealth>;
}

/// A file queued for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            filename,
            content_type,
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        Ok(Self::new(filename, bytes))
    }
}

/// Body of the service's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
}

impl ServiceHealth {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
