//! Observability counters.
//!
//! Atomic counters for settle outcomes, shared process-wide. The stage
//! records into these; nothing in the data path reads them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use crate::error::RejectReason;

/// Counter set for preamble processing.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Connections spliced through a preamble stage
    pub connections_total: AtomicU64,
    /// Preambles decoded successfully (v1 and v2)
    pub preambles_decoded: AtomicU64,
    /// Total bytes consumed by decoded preambles
    pub preamble_bytes: AtomicU64,
    /// Connections settled as plain pass-through traffic
    pub pass_through_total: AtomicU64,
    /// Pass-throughs caused by a malformed v1 line or v2 header
    pub rejects_malformed: AtomicU64,
    /// Pass-throughs caused by an unsupported v2 family/protocol
    pub rejects_unsupported_family: AtomicU64,
    /// Pass-throughs caused by the buffer cap
    pub rejects_oversized: AtomicU64,
    /// Pass-throughs caused by EOF or a stall before a verdict
    pub rejects_truncated: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_preamble(&self, len: usize) {
        self.preambles_decoded.fetch_add(1, Ordering::Relaxed);
        self.preamble_bytes.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn record_pass_through(&self, reason: RejectReason) {
        self.pass_through_total.fetch_add(1, Ordering::Relaxed);
        match reason {
            RejectReason::NoSignature => {}
            RejectReason::TooFewFields
            | RejectReason::BadPort
            | RejectReason::BadAddress
            | RejectReason::VersionMismatch(_)
            | RejectReason::ShortAddressBlock(_) => {
                self.rejects_malformed.fetch_add(1, Ordering::Relaxed);
            }
            RejectReason::UnsupportedFamily { .. } => {
                self.rejects_unsupported_family
                    .fetch_add(1, Ordering::Relaxed);
            }
            RejectReason::Oversized(_) => {
                self.rejects_oversized.fetch_add(1, Ordering::Relaxed);
            }
            RejectReason::Truncated => {
                self.rejects_truncated.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            preambles_decoded: self.preambles_decoded.load(Ordering::Relaxed),
            preamble_bytes: self.preamble_bytes.load(Ordering::Relaxed),
            pass_through_total: self.pass_through_total.load(Ordering::Relaxed),
            rejects_malformed: self.rejects_malformed.load(Ordering::Relaxed),
            rejects_unsupported_family: self.rejects_unsupported_family.load(Ordering::Relaxed),
            rejects_oversized: self.rejects_oversized.load(Ordering::Relaxed),
            rejects_truncated: self.rejects_truncated.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value view of [`Metrics`], cheap to log or assert against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_total: u64,
    pub preambles_decoded: u64,
    pub preamble_bytes: u64,
    pub pass_through_total: u64,
    pub rejects_malformed: u64,
    pub rejects_unsupported_family: u64,
    pub rejects_oversized: u64,
    pub rejects_truncated: u64,
}

/// Process-wide metrics instance.
pub fn global() -> &'static Metrics {
    static GLOBAL: OnceLock<Metrics> = OnceLock::new();
    GLOBAL.get_or_init(Metrics::new)
}
