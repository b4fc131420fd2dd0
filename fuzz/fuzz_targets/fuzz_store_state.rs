//! Fuzz target for the JSON store document.
//!
//! Whatever deserializes must hold only valid levels and reporter ids.

#![no_main]

use cs_common::Level;
use cs_core::store::StoreState;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(state) = serde_json::from_slice::<StoreState>(data) {
        for report in state.reports() {
            assert!((Level::MIN..=Level::MAX).contains(&report.occupancy.get()));
            assert!((Level::MIN..=Level::MAX).contains(&report.line_wait.get()));
            assert!(!report.reporter.as_str().is_empty());
        }
    }
});
