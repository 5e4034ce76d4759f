//! Sequential batch upload.

use tracing::{info, warn};

use crate::error::GalleryError;
use crate::notice::Notice;
use crate::record::ImageRecord;
use crate::store::{ImageStore, UploadFile};
use crate::surface::ListSurface;

/// The upload that stopped a batch.
#[derive(Debug)]
pub struct UploadFailure {
    pub file: String,
    pub error: GalleryError,
}

/// Outcome of a batch: every success was already handed on, at most one
/// failure is reported, and files after it were never sent.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: Vec<ImageRecord>,
    pub failure: Option<UploadFailure>,
    pub not_attempted: Vec<String>,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// The failure as a [`GalleryError::UploadFailed`] naming the file.
    pub fn failure_error(&self) -> Option<GalleryError> {
        self.failure.as_ref().map(|f| GalleryError::UploadFailed {
            file: f.file.clone(),
            reason: f.error.to_string(),
        })
    }
}

/// Upload `files` one after another, calling `on_uploaded` as soon as each
/// succeeds. Stops at the first failure.
pub async fn upload_batch<F>(
    store: &dyn ImageStore,
    files: Vec<UploadFile>,
    mut on_uploaded: F,
) -> UploadReport
where
    F: FnMut(&ImageRecord),
{
    let mut report = UploadReport::default();
    let mut queue = files.into_iter();

    for file in queue.by_ref() {
        let name = file.filename.clone();
        match store.upload_image(file).await {
            Ok(record) => {
                on_uploaded(&record);
                report.uploaded.push(record);
            }
            Err(error) => {
                warn!(file = %name, error = %error, "Upload failed, stopping batch");
                report.failure = Some(UploadFailure { file: name, error });
                break;
            }
        }
    }

    report.not_attempted = queue.map(|f| f.filename).collect();
    info!(
        uploaded = report.uploaded.len(),
        failed = report.failure.is_some(),
        not_attempted = report.not_attempted.len(),
        "Upload batch finished"
    );
    report
}

impl ListSurface {
    /// Upload through this surface's store, merging each new record into
    /// the list the moment its upload returns.
    pub async fn upload(&self, files: Vec<UploadFile>) -> UploadReport {
        let store = self.store();
        let report = upload_batch(store.as_ref(), files, |record| self.upsert(record.clone())).await;

        if !report.uploaded.is_empty() {
            let n = report.uploaded.len();
            let plural = if n > 1 { "s" } else { "" };
            self.notify(Notice::success(
                "Upload successful",
                format!("Successfully uploaded {n} image{plural}."),
            ));
        }
        if let Some(error) = report.failure_error() {
            self.notify(Notice::from_error("Upload failed", &error));
        }
        report
    }
}
