//! Fuzz target for policy.json configuration parsing.
//!
//! Parsing and semantic validation must never panic, only return an error.

#![no_main]

use cs_config::Policy;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(policy) = Policy::from_json_str(text) {
        let _ = policy.validate();
    }
});
