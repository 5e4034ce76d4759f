use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Description the Image Store Service reports while annotation is pending.
///
/// Any change to this literal on the service side is a breaking change.
pub const PROCESSING_DESCRIPTION: &str = "Processing...";

/// Opaque, service-assigned image identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ImageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One uploaded photo and its AI annotation, as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Unique within the collection, never reused
    pub id: ImageId,
    /// Locator the renderer uses to fetch pixels (e.g. `/images/<file>`)
    pub path: String,
    /// Display name, not guaranteed unique
    pub filename: String,
    /// Upload time as emitted by the service (ISO-8601, no offset)
    pub uploaded_at: NaiveDateTime,
    /// [`PROCESSING_DESCRIPTION`] or the final annotation text
    pub description: String,
    /// Relevance in [0, 1]; only present on search results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl ImageRecord {
    /// True while the service has not attached a description yet.
    pub fn is_processing(&self) -> bool {
        self.description == PROCESSING_DESCRIPTION
    }

    /// Similarity as a display percentage, e.g. `92.0%`.
    pub fn similarity_percent(&self) -> Option<String> {
        self.similarity.map(|s| format!("{:.1}%", s * 100.0))
    }
}
