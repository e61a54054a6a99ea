//! # Error Types
//!
//! Error handling for the preamble library.
//!
//! Only failures that the caller can meaningfully act on live here:
//! configuration problems and transport I/O. A preamble that fails to parse
//! is *not* an error; the connection degrades to plain traffic and the
//! rejection is reported through [`RejectReason`] for logging and metrics.
//!
//! All errors implement `std::error::Error` for interoperability.

use std::io;
use thiserror::Error;

/// Primary error type for transport and configuration operations.
#[derive(Error, Debug)]
pub enum PreambleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Type alias for Results using PreambleError
pub type Result<T> = std::result::Result<T, PreambleError>;

/// Why a buffered byte window was rejected as a preamble.
///
/// Never surfaced as an error: every variant degrades the connection to
/// pass-through. Carried on [`crate::core::ParseOutcome::Rejected`] so the
/// stage can log the cause with structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The first bytes match neither the v1 prefix nor the v2 signature.
    NoSignature,
    /// A v1 line had fewer than six space-separated fields.
    TooFewFields,
    /// A v1 port field was not a decimal u16.
    BadPort,
    /// A v1 address field was not an IP literal.
    BadAddress,
    /// The v2 version nibble was not 2.
    VersionMismatch(u8),
    /// A v2 address family / transport protocol this crate does not decode.
    UnsupportedFamily { family: u8, protocol: u8 },
    /// A v2 IPv4 header declared a length too short for its address block.
    ShortAddressBlock(u16),
    /// The accumulation buffer exceeded the configured cap before settling.
    Oversized(usize),
    /// The connection ended or stalled before the preamble completed.
    Truncated,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSignature => write!(f, "no preamble signature"),
            Self::TooFewFields => write!(f, "too few fields in v1 line"),
            Self::BadPort => write!(f, "invalid port in v1 line"),
            Self::BadAddress => write!(f, "invalid address in v1 line"),
            Self::VersionMismatch(v) => write!(f, "v2 signature with version nibble {v}"),
            Self::UnsupportedFamily { family, protocol } => {
                write!(f, "unsupported v2 family {family} / protocol {protocol}")
            }
            Self::ShortAddressBlock(len) => {
                write!(f, "v2 IPv4 header with short address block ({len} bytes)")
            }
            Self::Oversized(cap) => write!(f, "preamble exceeded {cap} byte cap"),
            Self::Truncated => {
                write!(f, "connection ended or stalled before the preamble completed")
            }
        }
    }
}
