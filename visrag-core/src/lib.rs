//! Visual RAG gallery client core
//!
//! This crate keeps a client's view of a photo gallery in step with the
//! Image Store Service that annotates each uploaded photo asynchronously.
//!
//! # Features
//!
//! - Keyed, immutable collection merges with monotonic completion
//! - Poll scheduling that runs only while something is still processing
//! - Exactly-once completion events per processing → done transition
//! - Independent list and detail surfaces with safe disposal
//! - HTTP client for the service plus a scriptable mock
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use visrag_core::{GalleryConfig, HttpImageStore, ListSurface, SurfaceEvent};
//!
//! # async fn example() -> visrag_core::Result<()> {
//! let config = GalleryConfig::from_env();
//! let store = Arc::new(HttpImageStore::from_config(&config)?);
//!
//! // Initial load; polling starts by itself while any image is processing
//! let (surface, mut events, _outcome) = ListSurface::open_list(store, &config).await;
//!
//! while let Some(event) = events.next().await {
//!     if let SurfaceEvent::Completed(record) = event {
//!         println!("{} -> {}", record.filename, record.description);
//!     }
//!     if !surface.is_processing() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod config;
pub mod error;
pub mod notice;
pub mod notifier;
pub mod record;
pub mod scheduler;
pub mod search;
pub mod store;
pub mod surface;
pub mod upload;

// Re-export main types for convenience
pub use collection::{Collection, PendingSet, RecordLookup};
pub use config::GalleryConfig;
pub use error::{GalleryError, Result};
pub use notice::{Notice, NoticeLevel};
pub use notifier::diff_completions;
pub use record::{ImageId, ImageRecord, PROCESSING_DESCRIPTION};
pub use scheduler::{
    ChannelTrigger, IntervalTrigger, PollScheduler, PollTrigger, SchedulerState, TriggerHandle,
};
pub use search::{SearchResults, SearchSession};
pub use store::{ImageStore, MockImageStore, ServiceHealth, UploadFile};
pub use surface::{
    DetailSurface, DetailView, ListSurface, ListView, RefreshOutcome, Surface, SurfaceEvent,
    SurfaceEvents, SurfaceView,
};
pub use upload::{upload_batch, UploadFailure, UploadReport};

// Network-dependent exports
#[cfg(feature = "network")]
pub use store::HttpImageStore;
