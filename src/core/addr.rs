//! Address codec shared by both preamble versions.
//!
//! The v2 binary form carries raw network-order octets; the v1 text form
//! carries IP literals and decimal ports. Both decode into the same
//! [`ProxyAddr`] pair handed to the address-rebinding side of the transport.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// The (source, destination) pair discovered in a preamble.
///
/// Value semantics; produced once per connection and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyAddr {
    /// Original client endpoint as seen by the proxy.
    pub src_addr: SocketAddr,
    /// Endpoint the client connected to on the proxy.
    pub dst_addr: SocketAddr,
}

/// Decode a 4-octet network-order IPv4 address and port into a socket
/// address. Total: any 4 bytes are a valid IPv4 address.
pub fn decode_ipv4(octets: [u8; 4], port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::from(octets)), port)
}

/// Parse a v1 host token and decimal port token into a socket address.
///
/// The host must be an IP literal (dotted-quad or IPv6 text; the family
/// token on the line is not cross-checked) and the port a decimal u16.
/// Returns `None` on any malformed token; the caller rejects the line.
pub fn parse_host_port(host: &str, port: &str) -> Option<SocketAddr> {
    let ip = IpAddr::from_str(host).ok()?;
    let port = u16::from_str(port).ok()?;
    Some(SocketAddr::new(ip, port))
}
