#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use proxy_preamble::protocol::stage::PreambleStage;

fuzz_target!(|data: &[u8]| {
    // Drive the state machine with attacker-chosen chunk boundaries: the
    // first byte picks a chunk size, the rest is the stream. Total bytes
    // out can never exceed total bytes in, and the stage must not panic.
    let Some((&step, stream)) = data.split_first() else {
        return;
    };
    let step = usize::from(step).max(1);

    let mut stage = PreambleStage::new();
    let mut forwarded = 0usize;
    let mut preambles = 0usize;
    for chunk in stream.chunks(step) {
        let progress = stage.advance(Bytes::copy_from_slice(chunk));
        forwarded += progress.forward.len();
        if progress.preamble.is_some() {
            preambles += 1;
        }
    }
    assert!(forwarded <= stream.len());
    assert!(preambles <= 1);
});
