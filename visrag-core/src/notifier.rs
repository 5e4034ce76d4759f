//! Completion detection between two reconciled views.

use crate::collection::{PendingSet, RecordLookup};
use crate::record::ImageRecord;

/// Records that were pending before a merge and are completed after it.
///
/// Only ids in `old_pending` are considered, so an initial population is
/// never reported as a completion, and a record that was already complete
/// before the merge is never reported again. Ids missing from `new_view`
/// are skipped; they stay pending until a view that contains them arrives.
pub fn diff_completions<V>(old_pending: &PendingSet, new_view: &V) -> Vec<ImageRecord>
where
    V: RecordLookup + ?Sized,
{
    old_pending
        .iter()
        .filter_map(|id| new_view.lookup(id))
        .filter(|record| !record.is_processing())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use crate::record::fixtures::{pending, record};
    use crate::record::ImageId;

    #[test]
    fn test_fires_once_across_three_polls() {
        let snapshots = vec![
            vec![pending("1", 0)],
            vec![pending("1", 0)],
            vec![record("1", 0, "a cat")],
        ];

        let mut collection = Collection::new().upsert(pending("1", 0));
        let mut fired_on = Vec::new();
        for (poll, snapshot) in snapshots.into_iter().enumerate() {
            let merged = collection.merge_snapshot(snapshot);
            for done in diff_completions(collection.pending(), &merged) {
                fired_on.push((poll, done.description));
            }
            collection = merged;
        }

        assert_eq!(fired_on, vec![(2, "a cat".to_string())]);

        // Further polls of the same state stay silent
        let again = collection.merge_snapshot(vec![record("1", 0, "a cat")]);
        assert!(diff_completions(collection.pending(), &again).is_empty());
    }

    #[test]
    fn test_initial_population_is_not_a_completion() {
        let empty = Collection::new();
        let loaded = empty.merge_snapshot(vec![record("1", 0, "a cat"), record("2", 1, "a dog")]);
        assert!(diff_completions(empty.pending(), &loaded).is_empty());
    }

    #[test]
    fn test_reports_only_transitioned_records() {
        let before = Collection::from_records(vec![pending("1", 0), pending("2", 1), record("3", 2, "done")]);
        let after = before.merge_snapshot(vec![
            record("1", 0, "a kite"),
            pending("2", 1),
            record("3", 2, "done"),
        ]);
        let completed = diff_completions(before.pending(), &after);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, ImageId::new("1"));
    }

    #[test]
    fn test_missing_record_is_not_reported() {
        let old_pending: PendingSet = vec![ImageId::new("9")].into_iter().collect();
        let view = Collection::from_records(vec![record("1", 0, "a kite")]);
        assert!(diff_completions(&old_pending, &view).is_empty());
    }
}
