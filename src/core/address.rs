//! Endpoint Parsing
//!
//! Parses the engine's textual client address (`"A.B.C.D:port"`) into
//! structured fields. Scanning is tolerant: the first field that fails to
//! scan, and every field after it, is left at zero. Callers treat the
//! all-zero endpoint as "unknown".

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// A parsed IPv4 endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Address octets A, B, C, D.
    pub octets: [u8; 4],
    /// UDP port.
    pub port: u16,
}

impl Endpoint {
    /// The all-zero "unknown" endpoint.
    pub const UNKNOWN: Endpoint = Endpoint { octets: [0; 4], port: 0 };

    /// Create from octets and port.
    pub const fn new(octets: [u8; 4], port: u16) -> Self {
        Self { octets, port }
    }

    /// Scan `text` against `d.d.d.d:d`.
    ///
    /// Never fails. Fields that were not matched stay zero.
    pub fn parse(text: &str) -> Self {
        Self::scan(text).0
    }

    /// Scan `text`, returning `None` unless all five fields matched.
    pub fn parse_strict(text: &str) -> Option<Self> {
        match Self::scan(text) {
            (endpoint, 5) => Some(endpoint),
            _ => None,
        }
    }

    /// Scan `text`, returning the endpoint and the number of fields matched.
    pub fn scan(text: &str) -> (Self, usize) {
        let mut scanner = Scanner::new(text);
        let mut endpoint = Endpoint::UNKNOWN;
        let mut matched = 0;

        for (i, separator) in ['.', '.', '.', ':'].into_iter().enumerate() {
            match scanner.octet() {
                Some(value) => endpoint.octets[i] = value,
                None => return (endpoint, matched),
            }
            matched += 1;
            if !scanner.literal(separator) {
                return (endpoint, matched);
            }
        }

        if let Some(port) = scanner.int().and_then(|v| u16::try_from(v).ok()) {
            endpoint.port = port;
            matched += 1;
        }

        (endpoint, matched)
    }

    /// Address as a big-endian u32 (network order), as stored in session state.
    pub fn ip_u32(&self) -> u32 {
        u32::from_be_bytes(self.octets)
    }

    /// Address as a std IPv4 address.
    pub fn ip(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.octets)
    }

    /// Whether this is the all-zero endpoint.
    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.octets;
        write!(f, "{}.{}.{}.{}:{}", a, b, c, d, self.port)
    }
}

/// Scan a bare `d.d.d.d` address (no port). Returns `None` on any failure.
pub fn parse_ipv4(text: &str) -> Option<[u8; 4]> {
    let mut scanner = Scanner::new(text);
    let mut octets = [0u8; 4];
    for (i, octet) in octets.iter_mut().enumerate() {
        if i > 0 && !scanner.literal('.') {
            return None;
        }
        *octet = scanner.octet()?;
    }
    Some(octets)
}

/// An address/mask pair used by the access lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedAddress {
    /// Base address.
    pub ip: [u8; 4],
    /// Per-octet mask.
    pub mask: [u8; 4],
}

impl MaskedAddress {
    /// Parse an address and mask from their dotted texts.
    pub fn parse(ip: &str, mask: &str) -> Option<Self> {
        Some(Self {
            ip: parse_ipv4(ip)?,
            mask: parse_ipv4(mask)?,
        })
    }

    /// Dotted text of the base address.
    pub fn ip_text(&self) -> String {
        Ipv4Addr::from(self.ip).to_string()
    }

    /// Dotted text of the mask.
    pub fn mask_text(&self) -> String {
        Ipv4Addr::from(self.mask).to_string()
    }

    /// Whether `addr` falls inside this address/mask.
    pub fn matches(&self, addr: [u8; 4]) -> bool {
        self.ip
            .iter()
            .zip(self.mask.iter())
            .zip(addr.iter())
            .all(|((ip, mask), a)| a & mask == ip & mask)
    }
}

/// Minimal `sscanf`-style scanner: `%d` skips leading whitespace and accepts
/// an optional sign; literal characters must match exactly.
struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn literal(&mut self, c: char) -> bool {
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn int(&mut self) -> Option<i64> {
        let trimmed = self.rest.trim_start();
        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }

        let value: i64 = unsigned[..digits].parse().ok()?;
        self.rest = &unsigned[digits..];
        Some(if negative { -value } else { value })
    }

    fn octet(&mut self) -> Option<u8> {
        self.int().and_then(|v| u8::try_from(v).ok())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_full_endpoint() {
        let endpoint = Endpoint::parse("10.0.0.5:27960");
        assert_eq!(endpoint, Endpoint::new([10, 0, 0, 5], 27960));
        assert_eq!(Endpoint::scan("10.0.0.5:27960").1, 5);
    }

    #[test]
    fn test_parse_garbage_is_unknown() {
        let endpoint = Endpoint::parse("not-an-ip");
        assert_eq!(endpoint, Endpoint::UNKNOWN);
        assert!(endpoint.is_unknown());
    }

    #[test]
    fn test_partial_scan_keeps_matched_fields() {
        let (endpoint, matched) = Endpoint::scan("192.168.x.1:1");
        assert_eq!(matched, 2);
        assert_eq!(endpoint.octets, [192, 168, 0, 0]);
        assert_eq!(endpoint.port, 0);
    }

    #[test]
    fn test_missing_port() {
        let (endpoint, matched) = Endpoint::scan("1.2.3.4");
        assert_eq!(matched, 4);
        assert_eq!(endpoint, Endpoint::new([1, 2, 3, 4], 0));
        assert!(Endpoint::parse_strict("1.2.3.4").is_none());
    }

    #[test]
    fn test_out_of_range_octet_stops_scan() {
        let (endpoint, matched) = Endpoint::scan("1.300.3.4:5");
        assert_eq!(matched, 1);
        assert_eq!(endpoint.octets, [1, 0, 0, 0]);
    }

    #[test]
    fn test_loopback_keyword() {
        // The engine reports local clients as "localhost"
        assert_eq!(Endpoint::parse("localhost"), Endpoint::UNKNOWN);
    }

    #[test]
    fn test_ip_u32_network_order() {
        let endpoint = Endpoint::new([10, 0, 0, 5], 0);
        assert_eq!(endpoint.ip_u32(), 0x0A00_0005);
        assert_eq!(endpoint.ip(), Ipv4Addr::new(10, 0, 0, 5));
    }

    #[test]
    fn test_masked_address_matching() {
        let entry = MaskedAddress::parse("10.1.0.0", "255.255.0.0").unwrap();
        assert!(entry.matches([10, 1, 44, 3]));
        assert!(!entry.matches([10, 2, 44, 3]));

        let exact = MaskedAddress::parse("1.2.3.4", "255.255.255.255").unwrap();
        assert!(exact.matches([1, 2, 3, 4]));
        assert!(!exact.matches([1, 2, 3, 5]));

        assert!(MaskedAddress::parse("1.2.3", "255.255.255.255").is_none());
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(text in ".*") {
            let (_, matched) = Endpoint::scan(&text);
            prop_assert!(matched <= 5);
        }

        #[test]
        fn prop_display_roundtrip(a: u8, b: u8, c: u8, d: u8, port: u16) {
            let endpoint = Endpoint::new([a, b, c, d], port);
            prop_assert_eq!(Endpoint::parse_strict(&endpoint.to_string()), Some(endpoint));
        }
    }
}
