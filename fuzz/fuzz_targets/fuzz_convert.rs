#![no_main]

use libfuzzer_sys::fuzz_target;

// Accepts arbitrary bytes, attempts to parse as JSON, feeds to convert().
// Goal: no panics and no hangs, even on malformed or cyclic documents.
fuzz_target!(|data: &[u8]| {
    if let Ok(document) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = oas_downgrade::convert(document, &Default::default());
    }
});
