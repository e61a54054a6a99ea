//! Version 2 binary preamble parser.
//!
//! Layout after the 12-byte signature: one version/command byte, one
//! family/protocol byte, a big-endian u16 length `L`, then `L` bytes of
//! address block plus optional TLV trailer. Only `AF_INET` with TCP or UDP
//! is decoded; every other family is skipped whole and the connection
//! continues as plain traffic.

use crate::core::addr;
use crate::core::detect::V2_SIGNATURE;
use crate::core::{ParseOutcome, Preamble};
use crate::error::RejectReason;

/// Signature plus version/command, family/protocol, and length fields.
const FIXED_HEADER_LEN: usize = V2_SIGNATURE.len() + 4;

/// src-ip(4) dst-ip(4) src-port(2) dst-port(2).
const INET_BLOCK_LEN: usize = 12;

const FAMILY_INET: u8 = 0x1;
const PROTO_STREAM: u8 = 0x1;
const PROTO_DGRAM: u8 = 0x2;

/// Parse a v2 binary preamble from the front of `buf`.
///
/// Precondition: [`crate::core::detect::detect`] returned
/// [`crate::core::detect::Detection::V2`], so the signature is present.
pub fn parse(buf: &[u8]) -> ParseOutcome {
    if buf.len() < FIXED_HEADER_LEN {
        return ParseOutcome::Incomplete;
    }

    let ver_cmd = buf[V2_SIGNATURE.len()];
    let version = ver_cmd >> 4;
    // The low nibble is the command (LOCAL/PROXY); not interpreted here.
    if version != 2 {
        // A future version's layout is unknown; consume nothing and let the
        // whole window pass through.
        return ParseOutcome::Rejected {
            consumed: 0,
            reason: RejectReason::VersionMismatch(version),
        };
    }

    let fam_proto = buf[V2_SIGNATURE.len() + 1];
    let family = fam_proto >> 4;
    let protocol = fam_proto & 0x0f;
    let declared_len = u16::from_be_bytes([
        buf[V2_SIGNATURE.len() + 2],
        buf[V2_SIGNATURE.len() + 3],
    ]);
    let total = FIXED_HEADER_LEN + declared_len as usize;

    if buf.len() < total {
        return ParseOutcome::Incomplete;
    }

    if family != FAMILY_INET || !matches!(protocol, PROTO_STREAM | PROTO_DGRAM) {
        // Address discovery is IPv4-only; drop the whole declared header and
        // continue as plain traffic.
        return ParseOutcome::Rejected {
            consumed: total,
            reason: RejectReason::UnsupportedFamily { family, protocol },
        };
    }

    if (declared_len as usize) < INET_BLOCK_LEN {
        // The header contradicts itself; nothing is skipped on its word.
        return ParseOutcome::Rejected {
            consumed: 0,
            reason: RejectReason::ShortAddressBlock(declared_len),
        };
    }

    let block = &buf[FIXED_HEADER_LEN..FIXED_HEADER_LEN + INET_BLOCK_LEN];
    let src_ip = [block[0], block[1], block[2], block[3]];
    let dst_ip = [block[4], block[5], block[6], block[7]];
    let src_port = u16::from_be_bytes([block[8], block[9]]);
    let dst_port = u16::from_be_bytes([block[10], block[11]]);

    // Bytes of `L` beyond the address block are TLV trailer: counted into
    // the preamble length, never interpreted.
    ParseOutcome::Complete(Preamble {
        addr: addr::ProxyAddr {
            src_addr: addr::decode_ipv4(src_ip, src_port),
            dst_addr: addr::decode_ipv4(dst_ip, dst_port),
        },
        len: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a v2 header: signature, ver/cmd, fam/proto, length, body.
    fn header(ver_cmd: u8, fam_proto: u8, body: &[u8]) -> Vec<u8> {
        let mut buf = V2_SIGNATURE.to_vec();
        buf.push(ver_cmd);
        buf.push(fam_proto);
        buf.extend_from_slice(&(body.len() as u16).to_be_bytes());
        buf.extend_from_slice(body);
        buf
    }

    fn inet_block(src: [u8; 4], dst: [u8; 4], sport: u16, dport: u16) -> Vec<u8> {
        let mut block = Vec::with_capacity(INET_BLOCK_LEN);
        block.extend_from_slice(&src);
        block.extend_from_slice(&dst);
        block.extend_from_slice(&sport.to_be_bytes());
        block.extend_from_slice(&dport.to_be_bytes());
        block
    }

    #[test]
    fn minimal_tcp4_header() {
        let buf = header(0x21, 0x11, &inet_block([10, 0, 0, 1], [10, 0, 0, 2], 1111, 80));
        match parse(&buf) {
            ParseOutcome::Complete(p) => {
                assert_eq!(p.addr.src_addr, "10.0.0.1:1111".parse().unwrap());
                assert_eq!(p.addr.dst_addr, "10.0.0.2:80".parse().unwrap());
                assert_eq!(p.len, 28);
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn udp4_decoded_like_tcp4() {
        let buf = header(0x21, 0x12, &inet_block([192, 0, 2, 9], [192, 0, 2, 10], 53, 5353));
        match parse(&buf) {
            ParseOutcome::Complete(p) => {
                assert_eq!(p.addr.src_addr, "192.0.2.9:53".parse().unwrap());
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn tlv_trailer_counted_not_interpreted() {
        let mut body = inet_block([10, 0, 0, 1], [10, 0, 0, 2], 1111, 80);
        // A PP2_TYPE_NOOP-shaped TLV plus junk; contents must not matter.
        body.extend_from_slice(&[0x04, 0x00, 0x03, 0xde, 0xad, 0xbe]);
        let buf = header(0x21, 0x11, &body);
        match parse(&buf) {
            ParseOutcome::Complete(p) => {
                assert_eq!(p.len, FIXED_HEADER_LEN + body.len());
                assert_eq!(p.addr.src_addr, "10.0.0.1:1111".parse().unwrap());
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn truncated_fixed_header_is_incomplete() {
        let buf = header(0x21, 0x11, &inet_block([10, 0, 0, 1], [10, 0, 0, 2], 1, 2));
        assert_eq!(parse(&buf[..14]), ParseOutcome::Incomplete);
        assert_eq!(parse(&buf[..15]), ParseOutcome::Incomplete);
    }

    #[test]
    fn declared_length_longer_than_window_is_incomplete() {
        let buf = header(0x21, 0x11, &inet_block([10, 0, 0, 1], [10, 0, 0, 2], 1, 2));
        // Drop the last body byte: L says 12, only 11 are present.
        assert_eq!(parse(&buf[..buf.len() - 1]), ParseOutcome::Incomplete);
    }

    #[test]
    fn version_nibble_mismatch_consumes_nothing() {
        let buf = header(0x31, 0x11, &inet_block([10, 0, 0, 1], [10, 0, 0, 2], 1, 2));
        assert_eq!(
            parse(&buf),
            ParseOutcome::Rejected {
                consumed: 0,
                reason: RejectReason::VersionMismatch(3),
            }
        );
    }

    #[test]
    fn inet6_family_skipped_whole() {
        // AF_INET6 address block: 16+16+2+2 = 36 bytes.
        let body = vec![0u8; 36];
        let buf = header(0x21, 0x21, &body);
        assert_eq!(
            parse(&buf),
            ParseOutcome::Rejected {
                consumed: FIXED_HEADER_LEN + 36,
                reason: RejectReason::UnsupportedFamily {
                    family: 2,
                    protocol: 1
                },
            }
        );
    }

    #[test]
    fn unspec_family_skipped_whole() {
        let buf = header(0x20, 0x00, &[]);
        assert_eq!(
            parse(&buf),
            ParseOutcome::Rejected {
                consumed: FIXED_HEADER_LEN,
                reason: RejectReason::UnsupportedFamily {
                    family: 0,
                    protocol: 0
                },
            }
        );
    }

    #[test]
    fn short_inet_block_rejected_without_skipping() {
        let buf = header(0x21, 0x11, &[0u8; 4]);
        assert_eq!(
            parse(&buf),
            ParseOutcome::Rejected {
                consumed: 0,
                reason: RejectReason::ShortAddressBlock(4),
            }
        );
    }
}
