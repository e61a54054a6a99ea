//! Version 1 text preamble parser.
//!
//! The v1 form is a single ASCII line:
//! `PROXY TCP4 192.0.2.1 198.51.100.1 56324 80\r\n`. The whole line, up to
//! and including the `\n`, is the preamble; on success exactly that many
//! bytes are consumed. A malformed line is consumed too (its bytes were
//! addressed to us, not to the application) but yields no address.
//!
//! The family token (`TCP4`, `TCP6`, `UNKNOWN`) is accepted without being
//! cross-checked against the shape of the address fields; the address text
//! itself decides whether the line parses.

use crate::core::addr;
use crate::core::{ParseOutcome, Preamble};
use crate::error::RejectReason;

/// Fields a v1 line must carry: the literal, the family token, two
/// addresses, two ports.
const MIN_FIELDS: usize = 6;

/// Parse a v1 text preamble from the front of `buf`.
///
/// Precondition: [`crate::core::detect::detect`] returned
/// [`crate::core::detect::Detection::V1`]. Reports `Incomplete` until a
/// `\n` terminator is present in the window; bounding that wait is the
/// caller's job.
pub fn parse(buf: &[u8]) -> ParseOutcome {
    let Some(lf) = buf.iter().position(|&b| b == b'\n') else {
        return ParseOutcome::Incomplete;
    };
    // The line owns every byte up to and including the terminator.
    let len = lf + 1;
    let line = trim_end(&buf[..len]);

    let fields: Vec<&[u8]> = line.split(|&b| b == b' ').collect();
    if fields.len() < MIN_FIELDS {
        return ParseOutcome::Rejected {
            consumed: len,
            reason: RejectReason::TooFewFields,
        };
    }

    let Some((src_host, dst_host)) = as_text(fields[2]).zip(as_text(fields[3])) else {
        return ParseOutcome::Rejected {
            consumed: len,
            reason: RejectReason::BadAddress,
        };
    };
    let Some((src_port, dst_port)) = as_text(fields[4]).zip(as_text(fields[5])) else {
        return ParseOutcome::Rejected {
            consumed: len,
            reason: RejectReason::BadPort,
        };
    };

    // Ports are checked before addresses so a line that is wrong in both
    // reports the port.
    if src_port.parse::<u16>().is_err() || dst_port.parse::<u16>().is_err() {
        return ParseOutcome::Rejected {
            consumed: len,
            reason: RejectReason::BadPort,
        };
    }

    let src = addr::parse_host_port(src_host, src_port);
    let dst = addr::parse_host_port(dst_host, dst_port);
    match src.zip(dst) {
        Some((src_addr, dst_addr)) => ParseOutcome::Complete(Preamble {
            addr: addr::ProxyAddr { src_addr, dst_addr },
            len,
        }),
        None => ParseOutcome::Rejected {
            consumed: len,
            reason: RejectReason::BadAddress,
        },
    }
}

fn trim_end(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && line[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    &line[..end]
}

fn as_text(field: &[u8]) -> Option<&str> {
    std::str::from_utf8(field).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(buf: &[u8]) -> Preamble {
        match parse(buf) {
            ParseOutcome::Complete(p) => p,
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn canonical_line_with_crlf() {
        let line = b"PROXY TCP4 192.0.2.1 198.51.100.1 56324 80\r\n";
        let p = complete(line);
        assert_eq!(p.addr.src_addr, "192.0.2.1:56324".parse().unwrap());
        assert_eq!(p.addr.dst_addr, "198.51.100.1:80".parse().unwrap());
        assert_eq!(p.len, line.len());
    }

    #[test]
    fn bare_lf_terminator_accepted() {
        let line = b"PROXY TCP4 10.0.0.1 10.0.0.2 1111 80\n";
        let p = complete(line);
        assert_eq!(p.addr.src_addr, "10.0.0.1:1111".parse().unwrap());
        assert_eq!(p.addr.dst_addr, "10.0.0.2:80".parse().unwrap());
        assert_eq!(p.len, line.len());
    }

    #[test]
    fn trailing_application_bytes_not_consumed() {
        let mut buf = b"PROXY TCP4 10.0.0.1 10.0.0.2 1111 80\r\n".to_vec();
        buf.extend_from_slice(b"GET / HTTP/1.1\r\n");
        let p = complete(&buf);
        assert_eq!(p.len, 38);
    }

    #[test]
    fn no_terminator_is_incomplete() {
        assert_eq!(
            parse(b"PROXY TCP4 10.0.0.1 10.0.0.2 1111 80"),
            ParseOutcome::Incomplete
        );
    }

    #[test]
    fn too_few_fields_consumes_the_line() {
        let line = b"PROXY TCP4 10.0.0.1\r\n";
        assert_eq!(
            parse(line),
            ParseOutcome::Rejected {
                consumed: line.len(),
                reason: RejectReason::TooFewFields,
            }
        );
    }

    #[test]
    fn non_numeric_port_consumes_the_line() {
        let line = b"PROXY TCP4 10.0.0.1 10.0.0.2 abc 80\r\n";
        assert_eq!(
            parse(line),
            ParseOutcome::Rejected {
                consumed: line.len(),
                reason: RejectReason::BadPort,
            }
        );
    }

    #[test]
    fn port_out_of_range_consumes_the_line() {
        let line = b"PROXY TCP4 10.0.0.1 10.0.0.2 70000 80\r\n";
        assert_eq!(
            parse(line),
            ParseOutcome::Rejected {
                consumed: line.len(),
                reason: RejectReason::BadPort,
            }
        );
    }

    #[test]
    fn malformed_ip_literal_rejected() {
        let line = b"PROXY TCP4 10.0.0 10.0.0.2 1111 80\r\n";
        assert_eq!(
            parse(line),
            ParseOutcome::Rejected {
                consumed: line.len(),
                reason: RejectReason::BadAddress,
            }
        );
    }

    #[test]
    fn family_token_not_cross_checked() {
        // TCP6 token with IPv4-shaped addresses still parses; the token is
        // carried, not enforced.
        let line = b"PROXY TCP6 10.0.0.1 10.0.0.2 1111 80\r\n";
        let p = complete(line);
        assert_eq!(p.addr.src_addr, "10.0.0.1:1111".parse().unwrap());
    }

    #[test]
    fn ipv6_literals_parse_best_effort() {
        let line = b"PROXY TCP6 2001:db8::1 2001:db8::2 443 8443\r\n";
        let p = complete(line);
        assert_eq!(p.addr.src_addr, "[2001:db8::1]:443".parse().unwrap());
        assert_eq!(p.addr.dst_addr, "[2001:db8::2]:8443".parse().unwrap());
    }

    #[test]
    fn extra_fields_ignored() {
        let line = b"PROXY TCP4 10.0.0.1 10.0.0.2 1111 80 extra junk\r\n";
        let p = complete(line);
        assert_eq!(p.len, line.len());
        assert_eq!(p.addr.dst_addr, "10.0.0.2:80".parse().unwrap());
    }
}
