//! Keyed image collection and the merge rules that reconcile it.
//!
//! A [`Collection`] is an immutable value: every merge returns a new one.
//! Records are keyed by [`ImageId`], so a collection can never hold two
//! records with the same id, and its [`PendingSet`] is computed when the
//! value is built so it always matches the records it came from.
//!
//! Two merge paths exist:
//!
//! - [`Collection::merge_snapshot`] for a full "list all" response, which is
//!   authoritative for every record it contains;
//! - [`Collection::upsert`] for a single record (upload response or an
//!   explicit change event).
//!
//! Both keep completion monotonic: once a record carries a final
//! description, a later processing copy of it never replaces that text.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::record::{ImageId, ImageRecord};

/// Read access to records by id, shared by every view that can be diffed
/// for completions.
pub trait RecordLookup {
    fn lookup(&self, id: &ImageId) -> Option<&ImageRecord>;
}

/// Ids whose current description is the processing sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSet(BTreeSet<ImageId>);

impl PendingSet {
    pub fn contains(&self, id: &ImageId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageId> {
        self.0.iter()
    }
}

impl FromIterator<ImageId> for PendingSet {
    fn from_iter<I: IntoIterator<Item = ImageId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Canonical set of known images, read newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    records: BTreeMap<ImageId, ImageRecord>,
    pending: PendingSet,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection keyed by id. A repeated id keeps its last occurrence.
    pub fn from_records(records: impl IntoIterator<Item = ImageRecord>) -> Self {
        let mut keyed = BTreeMap::new();
        for record in records {
            keyed.insert(record.id.clone(), record);
        }
        Self::from_map(keyed)
    }

    fn from_map(records: BTreeMap<ImageId, ImageRecord>) -> Self {
        let pending = records
            .values()
            .filter(|r| r.is_processing())
            .map(|r| r.id.clone())
            .collect();
        Self { records, pending }
    }

    /// Reconcile a full "list all" snapshot into this collection.
    ///
    /// The snapshot decides the result, with two carry-overs:
    /// a processing copy of a record already known as completed keeps the
    /// known description, and a locally pending record missing from the
    /// snapshot (an upload the listing does not show yet) is retained.
    pub fn merge_snapshot(&self, snapshot: impl IntoIterator<Item = ImageRecord>) -> Collection {
        let mut merged = BTreeMap::new();
        for record in snapshot {
            merged.insert(record.id.clone(), record);
        }

        for record in merged.values_mut() {
            if !record.is_processing() {
                continue;
            }
            if let Some(known) = self.records.get(&record.id) {
                if !known.is_processing() {
                    debug!(id = %record.id, "Ignoring stale processing copy of completed record");
                    record.description = known.description.clone();
                }
            }
        }

        for id in self.pending.iter() {
            if !merged.contains_key(id) {
                if let Some(known) = self.records.get(id) {
                    merged.insert(id.clone(), known.clone());
                }
            }
        }

        Self::from_map(merged)
    }

    /// Insert or replace one record, leaving every other entry untouched.
    pub fn upsert(&self, record: ImageRecord) -> Collection {
        if record.is_processing() {
            if let Some(known) = self.records.get(&record.id) {
                if !known.is_processing() {
                    debug!(id = %record.id, "Ignoring processing upsert over completed record");
                    return self.clone();
                }
            }
        }

        let mut records = self.records.clone();
        records.insert(record.id.clone(), record);
        Self::from_map(records)
    }

    pub fn get(&self, id: &ImageId) -> Option<&ImageRecord> {
        self.records.get(id)
    }

    /// Records sorted by upload time, most recent first. Equal timestamps
    /// fall back to id order so the sequence is deterministic.
    pub fn records(&self) -> Vec<&ImageRecord> {
        let mut ordered: Vec<&ImageRecord> = self.records.values().collect();
        ordered.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        ordered
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordLookup for Collection {
    fn lookup(&self, id: &ImageId) -> Option<&ImageRecord> {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::{pending, record};

    fn ids(collection: &Collection) -> Vec<&str> {
        collection.records().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_records_sorted_newest_first() {
        let collection = Collection::from_records(vec![
            record("a", 1, "first"),
            record("c", 9, "third"),
            record("b", 5, "second"),
        ]);
        assert_eq!(ids(&collection), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_equal_timestamps_ordered_by_id() {
        let collection =
            Collection::from_records(vec![record("z", 3, "z"), record("m", 3, "m")]);
        assert_eq!(ids(&collection), vec!["m", "z"]);
    }

    #[test]
    fn test_duplicate_id_in_snapshot_last_wins() {
        let collection = Collection::new().merge_snapshot(vec![
            record("7", 0, "first copy"),
            record("8", 1, "other"),
            record("7", 0, "second copy"),
        ]);
        assert_eq!(collection.len(), 2);
        assert_eq!(
            collection.get(&ImageId::new("7")).unwrap().description,
            "second copy"
        );
    }

    #[test]
    fn test_full_merge_is_idempotent() {
        let snapshot = vec![pending("1", 0), record("2", 1, "a dog"), pending("3", 2)];
        let once = Collection::new().merge_snapshot(snapshot.clone());
        let twice = once.merge_snapshot(snapshot);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_completion_survives_stale_snapshot() {
        let done = Collection::new().merge_snapshot(vec![record("1", 0, "a cat")]);
        let after_stale = done.merge_snapshot(vec![pending("1", 0)]);
        let record = after_stale.get(&ImageId::new("1")).unwrap();
        assert_eq!(record.description, "a cat");
        assert!(after_stale.pending().is_empty());
    }

    #[test]
    fn test_completion_survives_stale_upsert() {
        let done = Collection::from_records(vec![record("1", 0, "a cat")]);
        let after = done.upsert(pending("1", 0));
        assert_eq!(after, done);
    }

    #[test]
    fn test_ids_unique_after_mixed_merges() {
        let mut collection = Collection::new();
        collection = collection.upsert(pending("1", 0));
        collection = collection.merge_snapshot(vec![pending("1", 0), pending("2", 1)]);
        collection = collection.upsert(record("2", 1, "a tree"));
        collection = collection.merge_snapshot(vec![record("1", 0, "a boat"), record("2", 1, "a tree")]);
        collection = collection.upsert(record("1", 0, "a boat"));

        let mut seen: Vec<&str> = ids(&collection);
        let total = seen.len();
        seen.dedup();
        assert_eq!(total, 2);
        assert_eq!(seen.len(), total);
    }

    #[test]
    fn test_upsert_inserts_and_replaces() {
        let base = Collection::from_records(vec![record("1", 0, "old"), record("2", 1, "keep")]);

        let inserted = base.upsert(pending("3", 5));
        assert_eq!(ids(&inserted), vec!["3", "2", "1"]);
        assert!(inserted.pending().contains(&ImageId::new("3")));

        let replaced = base.upsert(record("1", 0, "new"));
        assert_eq!(replaced.get(&ImageId::new("1")).unwrap().description, "new");
        assert_eq!(replaced.get(&ImageId::new("2")), base.get(&ImageId::new("2")));
        // The original value is untouched
        assert_eq!(base.get(&ImageId::new("1")).unwrap().description, "old");
    }

    #[test]
    fn test_pending_set_tracks_records() {
        let collection = Collection::from_records(vec![
            pending("1", 0),
            record("2", 1, "done"),
            pending("3", 2),
        ]);
        let pending_ids: Vec<&str> = collection.pending().iter().map(|id| id.as_str()).collect();
        assert_eq!(pending_ids, vec!["1", "3"]);

        let updated = collection.upsert(record("1", 0, "a lamp"));
        let pending_ids: Vec<&str> = updated.pending().iter().map(|id| id.as_str()).collect();
        assert_eq!(pending_ids, vec!["3"]);
        assert!(updated.has_pending());
    }

    #[test]
    fn test_pending_upload_absent_from_snapshot_is_retained() {
        let local = Collection::from_records(vec![record("1", 0, "a tree")]).upsert(pending("7", 9));
        let merged = local.merge_snapshot(vec![record("1", 0, "a tree")]);
        assert_eq!(ids(&merged), vec!["7", "1"]);
        assert!(merged.pending().contains(&ImageId::new("7")));
    }

    #[test]
    fn test_completed_record_absent_from_snapshot_is_dropped() {
        let local = Collection::from_records(vec![record("1", 0, "a tree"), record("2", 1, "a rock")]);
        let merged = local.merge_snapshot(vec![record("2", 1, "a rock")]);
        assert_eq!(ids(&merged), vec!["2"]);
    }

    #[test]
    fn test_snapshot_completion_replaces_pending() {
        let local = Collection::new().upsert(pending("7", 0));
        let merged = local.merge_snapshot(vec![record("7", 0, "a red bicycle")]);
        assert!(!merged.has_pending());
        assert_eq!(
            merged.get(&ImageId::new("7")).unwrap().description,
            "a red bicycle"
        );
    }
}
