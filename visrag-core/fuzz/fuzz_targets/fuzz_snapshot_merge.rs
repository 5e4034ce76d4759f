#![no_main]

//! Fuzz target for snapshot merging.
//!
//! Feeds two decoded snapshots through the collection in sequence and
//! checks that ids stay unique, ordering holds, the pending set matches
//! the processing records, and no completed record goes back to
//! processing.
//!
//! Run with: cargo +nightly fuzz run fuzz_snapshot_merge

use std::collections::HashSet;

use libfuzzer_sys::fuzz_target;
use visrag_core::{Collection, ImageRecord};

fuzz_target!(|data: &[u8]| {
    // Split the input into two snapshots at the first NUL byte
    let mut parts = data.splitn(2, |b| *b == 0);
    let first = parts.next().unwrap_or_default();
    let second = parts.next().unwrap_or_default();

    let Ok(first) = serde_json::from_slice::<Vec<ImageRecord>>(first) else {
        return;
    };
    let second = serde_json::from_slice::<Vec<ImageRecord>>(second).unwrap_or_default();

    let before = Collection::new().merge_snapshot(first);
    let after = before.merge_snapshot(second);

    for collection in [&before, &after] {
        let records = collection.records();
        let ids: HashSet<_> = records.iter().map(|r| &r.id).collect();
        assert_eq!(ids.len(), records.len(), "duplicate ids after merge");

        for pair in records.windows(2) {
            assert!(
                (pair[0].uploaded_at, &pair[1].id) >= (pair[1].uploaded_at, &pair[0].id),
                "records out of order"
            );
        }

        for record in &records {
            assert_eq!(collection.pending().contains(&record.id), record.is_processing());
        }
    }

    for record in before.records() {
        if record.is_processing() {
            continue;
        }
        if let Some(now) = after.get(&record.id) {
            assert!(!now.is_processing(), "completed record regressed");
        }
    }
});
