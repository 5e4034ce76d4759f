use crate::collection::{PendingSet, RecordLookup};
use crate::record::{ImageId, ImageRecord};

use super::SurfaceView;

/// A single focal record. Snapshots only matter for that record's id, so
/// the surface stops polling as soon as it completes, whatever else is
/// still processing elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    record: ImageRecord,
}

impl DetailView {
    pub fn new(record: ImageRecord) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &ImageRecord {
        &self.record
    }

    pub fn id(&self) -> &ImageId {
        &self.record.id
    }

    /// Take `incoming` as the new focal record unless it would regress a
    /// completed description. A search hit's similarity survives a refresh
    /// from the plain listing, which carries none.
    fn reconcile(&self, mut incoming: ImageRecord) -> Self {
        if incoming.is_processing() && !self.record.is_processing() {
            return self.clone();
        }
        if incoming.similarity.is_none() {
            incoming.similarity = self.record.similarity;
        }
        Self::new(incoming)
    }
}

impl RecordLookup for DetailView {
    fn lookup(&self, id: &ImageId) -> Option<&ImageRecord> {
        (self.record.id == *id).then_some(&self.record)
    }
}

impl SurfaceView for DetailView {
    const KIND: &'static str = "detail";

    fn pending(&self) -> PendingSet {
        if self.record.is_processing() {
            std::iter::once(self.record.id.clone()).collect()
        } else {
            PendingSet::default()
        }
    }

    fn apply_snapshot(&self, snapshot: Vec<ImageRecord>) -> Self {
        // Last occurrence wins, as for collections
        match snapshot.into_iter().rev().find(|r| r.id == self.record.id) {
            Some(incoming) => self.reconcile(incoming),
            None => self.clone(),
        }
    }

    fn apply_record(&self, record: ImageRecord) -> Self {
        if record.id == self.record.id {
            self.reconcile(record)
        } else {
            self.clone()
        }
    }

    fn has_pending(&self) -> bool {
        self.record.is_processing()
    }
}
