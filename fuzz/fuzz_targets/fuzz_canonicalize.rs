//! Fuzz target for canonical JSON.
//!
//! Goal: for any JSON document, canonical bytes are a fixed point, and the strict serializer
//! agrees with the value writer.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_canonicalize
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use veraseal_domain::{canonicalize, canonicalize_value};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let bytes = canonicalize_value(&value);
    let reparsed: serde_json::Value =
        serde_json::from_slice(&bytes).expect("canonical bytes must parse");
    assert_eq!(canonicalize_value(&reparsed), bytes, "canonical form is not a fixed point");

    // Parsed JSON never holds non-finite numbers, so the strict path must succeed.
    let strict = canonicalize(&value).expect("parsed JSON is always canonicalizable");
    assert_eq!(strict, bytes);
});
