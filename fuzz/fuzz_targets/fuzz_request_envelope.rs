//! Fuzz target for request envelope parsing.
//!
//! Goal: arbitrary bytes never panic the parser, and every envelope it accepts evaluates
//! without tripping a POST invariant.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_request_envelope
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use veraseal_domain::{EnvelopeLimits, PolicyChoice, evaluate, parse_envelope_slice};

fuzz_target!(|data: &[u8]| {
    let limits = EnvelopeLimits::default();
    let Ok(request) = parse_envelope_slice(data, &limits) else {
        return;
    };
    for choice in [PolicyChoice::Current, PolicyChoice::Legacy] {
        if let Err(e) = evaluate(&request, choice, &limits) {
            panic!("accepted envelope failed to evaluate: {e}");
        }
    }
});
