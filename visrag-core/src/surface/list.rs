use crate::collection::{Collection, PendingSet, RecordLookup};
use crate::record::{ImageId, ImageRecord};

use super::SurfaceView;

/// The gallery list: the whole collection, polled while any record in it
/// is processing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
    collection: Collection,
}

impl ListView {
    pub fn new(collection: Collection) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Records newest first.
    pub fn records(&self) -> Vec<&ImageRecord> {
        self.collection.records()
    }

    pub fn get(&self, id: &ImageId) -> Option<&ImageRecord> {
        self.collection.get(id)
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.collection.pending().len()
    }

    /// "N image(s) still processing" while anything is pending.
    pub fn pending_banner(&self) -> Option<String> {
        match self.pending_count() {
            0 => None,
            1 => Some("1 image still processing".to_string()),
            n => Some(format!("{n} images still processing")),
        }
    }
}

impl RecordLookup for ListView {
    fn lookup(&self, id: &ImageId) -> Option<&ImageRecord> {
        self.collection.get(id)
    }
}

impl SurfaceView for ListView {
    const KIND: &'static str = "list";

    fn pending(&self) -> PendingSet {
        self.collection.pending().clone()
    }

    fn apply_snapshot(&self, snapshot: Vec<ImageRecord>) -> Self {
        Self::new(self.collection.merge_snapshot(snapshot))
    }

    fn apply_record(&self, record: ImageRecord) -> Self {
        Self::new(self.collection.upsert(record))
    }

    fn has_pending(&self) -> bool {
        self.collection.has_pending()
    }
}
