//! Mock Image Store Service for testing.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use super::{ImageStore, ServiceHealth, UploadFile};
use crate::error::{GalleryError, Result};
use crate::record::{ImageId, ImageRecord, PROCESSING_DESCRIPTION};

/// In-memory, scriptable stand-in for the Image Store Service.
///
/// Like the real service, an uploaded image only shows up in the listing
/// once [`MockImageStore::complete`] attaches its description.
/// WARNING: test and demo use only.
pub struct MockImageStore {
    state: Mutex<MockState>,
    /// `true` while list calls are held in flight
    gate: watch::Sender<bool>,
    list_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

#[derive(Default)]
struct MockState {
    listing: Vec<ImageRecord>,
    uploads: HashMap<ImageId, ImageRecord>,
    scripted_lists: VecDeque<std::result::Result<Vec<ImageRecord>, String>>,
    search_results: Vec<ImageRecord>,
    failing_uploads: HashSet<String>,
    next_ids: VecDeque<String>,
    last_upload_at: Option<NaiveDateTime>,
    unhealthy: bool,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self::with_images(Vec::new())
    }

    /// Start with `images` already listed.
    pub fn with_images(images: Vec<ImageRecord>) -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            state: Mutex::new(MockState {
                listing: images,
                ..Default::default()
            }),
            gate,
            list_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not take the other assertions down with it
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the listing returned by unscripted list calls.
    pub fn set_images(&self, images: Vec<ImageRecord>) {
        self.state().listing = images;
    }

    /// Attach a final description to `id`, listing the record if it was an
    /// upload the listing did not show yet.
    pub fn complete(&self, id: &ImageId, description: &str) {
        let mut state = self.state();
        if let Some(listed) = state.listing.iter_mut().find(|r| &r.id == id) {
            listed.description = description.to_string();
            return;
        }
        if let Some(mut uploaded) = state.uploads.get(id).cloned() {
            uploaded.description = description.to_string();
            state.listing.push(uploaded);
        }
    }

    /// Queue a one-shot list response served before the regular listing.
    pub fn push_list(&self, images: Vec<ImageRecord>) {
        self.state().scripted_lists.push_back(Ok(images));
    }

    /// Queue a one-shot list failure.
    pub fn push_list_failure(&self, reason: &str) {
        self.state()
            .scripted_lists
            .push_back(Err(reason.to_string()));
    }

    pub fn set_search_results(&self, hits: Vec<ImageRecord>) {
        self.state().search_results = hits;
    }

    /// Make every upload of `filename` fail.
    pub fn fail_upload_of(&self, filename: &str) {
        self.state().failing_uploads.insert(filename.to_string());
    }

    /// Id assigned to the next upload instead of a random one.
    pub fn queue_upload_id(&self, id: &str) {
        self.state().next_ids.push_back(id.to_string());
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.state().unhealthy = unhealthy;
    }

    /// Hold list calls in flight. Their responses are captured when the
    /// call starts and delivered after [`MockImageStore::release_lists`].
    pub fn hold_lists(&self) {
        self.gate.send_replace(true);
    }

    pub fn release_lists(&self) {
        self.gate.send_replace(false);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn next_upload_time(state: &mut MockState) -> NaiveDateTime {
        let now = Utc::now().naive_utc();
        // Strictly increasing even for uploads within the same clock tick
        let at = match state.last_upload_at {
            Some(last) if now <= last => last + ChronoDuration::microseconds(1),
            _ => now,
        };
        state.last_upload_at = Some(at);
        at
    }
}

impl Default for MockImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let response = {
            let mut state = self.state();
            match state.scripted_lists.pop_front() {
                Some(scripted) => scripted,
                None => Ok(state.listing.clone()),
            }
        };

        let mut gate = self.gate.subscribe();
        // The sender lives in `self`, so waiting cannot fail
        let _ = gate.wait_for(|held| !*held).await;

        response.map_err(GalleryError::Transport)
    }

    async fn upload_image(&self, file: UploadFile) -> Result<ImageRecord> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        if state.failing_uploads.contains(&file.filename) {
            return Err(GalleryError::Status {
                endpoint: "upload",
                status: 500,
            });
        }

        let id = state
            .next_ids
            .pop_front()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let stored_name = format!("{id}_{}", file.filename);
        let record = ImageRecord {
            id: ImageId::new(id),
            path: format!("/images/{stored_name}"),
            filename: stored_name,
            uploaded_at: Self::next_upload_time(&mut state),
            description: PROCESSING_DESCRIPTION.to_string(),
            similarity: None,
        };
        debug!(id = %record.id, bytes = file.bytes.len(), "Mock upload stored");
        state.uploads.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn search(&self, _query: &str) -> Result<Vec<ImageRecord>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state().search_results.clone())
    }

    async fn health(&self) -> Result<ServiceHealth> {
        if self.state().unhealthy {
            return Err(GalleryError::Transport("mock service unavailable".into()));
        }
        Ok(ServiceHealth::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;

    #[tokio::test]
    async fn test_upload_not_listed_until_complete() {
        let store = MockImageStore::new();
        store.queue_upload_id("7");
        let uploaded = store
            .upload_image(UploadFile::new("bike.jpg", vec![1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(uploaded.id, ImageId::new("7"));
        assert!(uploaded.is_processing());
        assert!(store.list_images().await.unwrap().is_empty());

        store.complete(&uploaded.id, "a red bicycle");
        let listed = store.list_images().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].description, "a red bicycle");
    }

    #[tokio::test]
    async fn test_scripted_responses_come_first() {
        let store = MockImageStore::with_images(vec![record("1", 0, "listed")]);
        store.push_list_failure("connection refused");
        store.push_list(vec![]);

        assert!(store.list_images().await.unwrap_err().is_transport());
        assert!(store.list_images().await.unwrap().is_empty());
        assert_eq!(store.list_images().await.unwrap().len(), 1);
        assert_eq!(store.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_failing_upload() {
        let store = MockImageStore::new();
        store.fail_upload_of("broken.jpg");
        let err = store
            .upload_image(UploadFile::new("broken.jpg", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::Status { status: 500, .. }));
        assert_eq!(store.upload_calls(), 1);
    }

    #[tokio::test]
    async fn test_upload_times_increase() {
        let store = MockImageStore::new();
        let a = store.upload_image(UploadFile::new("a.jpg", vec![])).await.unwrap();
        let b = store.upload_image(UploadFile::new("b.jpg", vec![])).await.unwrap();
        assert!(b.uploaded_at > a.uploaded_at);
        assert_ne!(a.id, b.id);
    }
}
