//! Per-connection preamble stage.
//!
//! One [`PreambleStage`] lives at the front of each accepted connection. It
//! buffers inbound chunks only while the first bytes are still ambiguous,
//! makes exactly one classification, and then becomes permanently inert:
//! once settled, every later chunk is handed through untouched in O(1),
//! however preamble-shaped it looks. That single attempt is what stops a
//! peer from forging a second address override mid-stream.
//!
//! The stage never performs I/O and never fails a connection. It is a
//! synchronous transform driven by whatever single execution context owns
//! the connection's inbound bytes.

use bytes::{Buf, Bytes, BytesMut};
use tracing::debug;

use crate::core::{self, ParseOutcome, Preamble};
use crate::error::RejectReason;
use crate::utils::metrics;

/// Default cap on the size of an acceptable preamble.
///
/// Generously above the 108-byte v1 worst case and any sane v2 header with
/// a small TLV trailer. The cap bounds both the bytes buffered while a
/// verdict is pending and the length of a header the stage will accept, so
/// the verdict for an over-cap header is the same however its bytes are
/// chunked.
pub const DEFAULT_MAX_PREAMBLE_LEN: usize = 512;

/// Stage lifecycle. `AwaitingData` is initial; both settled states are
/// terminal for the life of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// Still buffering; no verdict yet, no bytes released downstream.
    AwaitingData,
    /// A preamble was decoded and its address reported.
    SettledWithResult,
    /// No usable preamble; the connection is plain traffic.
    SettledPassThrough,
}

/// What one chunk delivery produced.
#[derive(Debug)]
pub struct Progress {
    /// Bytes released downstream by this delivery, in original order.
    /// Empty while the stage is still waiting for a verdict.
    pub forward: Bytes,
    /// The decoded preamble, present exactly once: on the delivery that
    /// settled the stage with a result.
    pub preamble: Option<Preamble>,
}

/// The per-connection state machine.
#[derive(Debug)]
pub struct PreambleStage {
    buf: BytesMut,
    state: StageState,
    max_preamble_len: usize,
}

impl Default for PreambleStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PreambleStage {
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_PREAMBLE_LEN)
    }

    pub fn with_max_len(max_preamble_len: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            state: StageState::AwaitingData,
            max_preamble_len,
        }
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    /// True once the stage has reached either terminal state.
    pub fn is_settled(&self) -> bool {
        self.state != StageState::AwaitingData
    }

    /// Deliver one chunk of inbound bytes.
    ///
    /// Settled fast path: the chunk comes straight back, zero-copy. While
    /// awaiting data the chunk is accumulated and the window re-examined
    /// from the start; bytes are only released on a terminal verdict.
    pub fn advance(&mut self, chunk: Bytes) -> Progress {
        if self.is_settled() {
            return Progress {
                forward: chunk,
                preamble: None,
            };
        }

        self.buf.extend_from_slice(&chunk);

        // The cap applies to the preamble itself, whatever the chunking:
        // an incomplete window past the cap can only complete beyond it,
        // and a decoded or rejected header longer than the cap is refused
        // even when it arrived whole. Forwarding with consumed = 0 keeps
        // the residual identical to the chunked case.
        match core::parse(&self.buf) {
            ParseOutcome::Incomplete => {
                if self.buf.len() > self.max_preamble_len {
                    return self.settle_oversized();
                }
                Progress {
                    forward: Bytes::new(),
                    preamble: None,
                }
            }
            ParseOutcome::Complete(preamble) if preamble.len > self.max_preamble_len => {
                self.settle_oversized()
            }
            ParseOutcome::Complete(preamble) => self.settle_with_result(preamble),
            ParseOutcome::Rejected { consumed, .. } if consumed > self.max_preamble_len => {
                self.settle_oversized()
            }
            ParseOutcome::Rejected { consumed, reason } => {
                self.settle_pass_through(consumed, reason)
            }
        }
    }

    fn settle_oversized(&mut self) -> Progress {
        self.settle_pass_through(0, RejectReason::Oversized(self.max_preamble_len))
    }

    /// Force a pass-through verdict from outside the parse path, releasing
    /// whatever was buffered. Used by the transport when the connection ends
    /// or stalls before the window settles on its own. No-op once settled.
    pub fn settle_inert(&mut self, reason: RejectReason) -> Progress {
        if self.is_settled() {
            return Progress {
                forward: Bytes::new(),
                preamble: None,
            };
        }
        self.settle_pass_through(0, reason)
    }

    fn settle_with_result(&mut self, preamble: Preamble) -> Progress {
        self.state = StageState::SettledWithResult;
        metrics::global().record_preamble(preamble.len);
        debug!(
            src = %preamble.addr.src_addr,
            dst = %preamble.addr.dst_addr,
            preamble_len = preamble.len,
            "decoded proxy preamble"
        );
        let mut buf = std::mem::take(&mut self.buf);
        buf.advance(preamble.len);
        Progress {
            forward: buf.freeze(),
            preamble: Some(preamble),
        }
    }

    fn settle_pass_through(&mut self, consumed: usize, reason: RejectReason) -> Progress {
        self.state = StageState::SettledPassThrough;
        metrics::global().record_pass_through(reason);
        debug!(%reason, dropped = consumed, "no proxy preamble; passing traffic through");
        let mut buf = std::mem::take(&mut self.buf);
        buf.advance(consumed);
        Progress {
            forward: buf.freeze(),
            preamble: None,
        }
    }
}
