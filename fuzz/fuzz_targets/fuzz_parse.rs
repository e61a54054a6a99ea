#![no_main]

use libfuzzer_sys::fuzz_target;
use proxy_preamble::core::{parse, ParseOutcome};

fuzz_target!(|data: &[u8]| {
    // Arbitrary first bytes of a connection must never panic, and a
    // rejection must never claim more bytes than exist.
    match parse(data) {
        ParseOutcome::Complete(p) => assert!(p.len <= data.len()),
        ParseOutcome::Rejected { consumed, .. } => assert!(consumed <= data.len()),
        ParseOutcome::Incomplete => {}
    }
});
