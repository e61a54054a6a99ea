//! Preamble detection.
//!
//! Classifies the first bytes of a connection without consuming them.
//! Detection looks at no more than the first 12 bytes and never depends on
//! whether the rest of the header parses, so it stays O(1) and separable
//! from the parsers.

/// Fixed 12-byte signature opening every v2 binary preamble
/// (`\r\n\r\n\0\r\nQUIT\n`).
pub const V2_SIGNATURE: [u8; 12] = [
    0x0d, 0x0a, 0x0d, 0x0a, 0x00, 0x0d, 0x0a, 0x51, 0x55, 0x49, 0x54, 0x0a,
];

/// ASCII prefix opening every v1 text preamble.
pub const V1_PREFIX: &[u8; 5] = b"PROXY";

/// Classification of a byte window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Too few bytes to decide; retain what was read and re-check later.
    NeedMoreData,
    /// The window cannot be a preamble. Nothing was consumed.
    NotAPreamble,
    /// The window opens with the v1 text prefix.
    V1,
    /// The window opens with the full v2 binary signature.
    V2,
}

/// Classify the front of `buf`.
///
/// A window still consistent with either prefix but shorter than that
/// prefix yields `NeedMoreData`; a window that already contradicts both
/// yields `NotAPreamble` without waiting for 12 bytes.
pub fn detect(buf: &[u8]) -> Detection {
    if buf.starts_with(&V2_SIGNATURE[..buf.len().min(V2_SIGNATURE.len())]) {
        if buf.len() >= V2_SIGNATURE.len() {
            Detection::V2
        } else {
            Detection::NeedMoreData
        }
    } else if buf.starts_with(&V1_PREFIX[..buf.len().min(V1_PREFIX.len())]) {
        if buf.len() >= V1_PREFIX.len() {
            Detection::V1
        } else {
            Detection::NeedMoreData
        }
    } else {
        Detection::NotAPreamble
    }
}
