#![no_main]

//! Fuzz target for decoding a service listing.
//!
//! Arbitrary bytes must either fail to decode or yield records whose
//! helpers never panic.
//!
//! Run with: cargo +nightly fuzz run fuzz_record_decode

use libfuzzer_sys::fuzz_target;
use visrag_core::ImageRecord;

fuzz_target!(|data: &[u8]| {
    if let Ok(records) = serde_json::from_slice::<Vec<ImageRecord>>(data) {
        for record in &records {
            let _ = record.is_processing();
            let _ = record.similarity_percent();
        }
    }
});
