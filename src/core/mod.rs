//! # Core Preamble Components
//!
//! Detection and decoding of PROXY protocol preambles.
//!
//! This module provides the pure, synchronous half of the crate: given a
//! read-only window of the first bytes of a connection, classify it and
//! decode the address pair it carries. Nothing here performs I/O or holds
//! per-connection state; that belongs to [`crate::protocol::stage`].
//!
//! ## Wire Formats (inbound only, never emitted)
//! ```text
//! v1:  "PROXY" SP family SP src-ip SP dst-ip SP src-port SP dst-port "\r\n"
//! v2:  [Signature(12)] [VerCmd(1)] [FamProto(1)] [Length(2, BE)] [Addr+TLV(L)]
//! ```
//!
//! ## Security
//! - Detection is O(1) and depends only on the first 12 bytes.
//! - Every malformed or unsupported header degrades to pass-through; no
//!   byte window ever produces a best-guess address.

pub mod addr;
pub mod detect;
pub mod v1;
pub mod v2;

use crate::error::RejectReason;
use addr::ProxyAddr;
use detect::Detection;

/// A fully decoded preamble: the address pair it carried and the exact
/// number of bytes it occupied at the front of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preamble {
    /// Discovered (source, destination) pair.
    pub addr: ProxyAddr,
    /// Bytes the preamble occupied, including terminator or TLV trailer.
    pub len: usize,
}

/// Outcome of one parse attempt over the accumulated byte window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// More bytes are required before the window can be classified or
    /// decoded. Nothing was consumed; re-invoke once more bytes arrive.
    Incomplete,
    /// A preamble was decoded. `Preamble::len` bytes belong to it; the rest
    /// of the window is application data.
    Complete(Preamble),
    /// The window is not a usable preamble. The first `consumed` bytes are
    /// preamble-shaped debris to drop; everything after them is application
    /// data to forward untouched.
    Rejected {
        consumed: usize,
        reason: RejectReason,
    },
}

/// Classify and decode the front of `buf` in one call.
///
/// Detection and parsing stay separable ([`detect::detect`] never looks past
/// the first 12 bytes) but callers that just want an answer use this.
pub fn parse(buf: &[u8]) -> ParseOutcome {
    match detect::detect(buf) {
        Detection::NeedMoreData => ParseOutcome::Incomplete,
        Detection::NotAPreamble => ParseOutcome::Rejected {
            consumed: 0,
            reason: RejectReason::NoSignature,
        },
        Detection::V1 => v1::parse(buf),
        Detection::V2 => v2::parse(buf),
    }
}
