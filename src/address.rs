//! Address family classification.

use std::fmt;

/// IP address family, as far as endpoint routing cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    IPv4,
    IPv6,
}

impl AddressFamily {
    pub const ALL: [AddressFamily; 2] = [AddressFamily::IPv4, AddressFamily::IPv6];
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::IPv4 => write!(f, "ipv4"),
            AddressFamily::IPv6 => write!(f, "ipv6"),
        }
    }
}

/// Classify an address by its literal form.
///
/// No validation happens here: anything with a colon is IPv6, everything
/// else is IPv4. The provider is the one that rejects garbage.
pub fn classify(ip: &str) -> AddressFamily {
    if ip.contains(':') {
        AddressFamily::IPv6
    } else {
        AddressFamily::IPv4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ipv4() {
        assert_eq!(classify("8.8.8.8"), AddressFamily::IPv4);
        assert_eq!(classify("203.0.113.5"), AddressFamily::IPv4);
    }

    #[test]
    fn test_classify_ipv6() {
        assert_eq!(classify("2001:db8::1"), AddressFamily::IPv6);
        assert_eq!(classify("::1"), AddressFamily::IPv6);
        assert_eq!(classify("::ffff:192.0.2.1"), AddressFamily::IPv6);
    }

    #[test]
    fn test_classify_does_not_validate() {
        // Garbage is passed through with a family assigned by the colon rule.
        assert_eq!(classify("not-an-ip"), AddressFamily::IPv4);
        assert_eq!(classify("999.999.1"), AddressFamily::IPv4);
        assert_eq!(classify("a:b"), AddressFamily::IPv6);
        assert_eq!(classify(":"), AddressFamily::IPv6);
    }

    #[test]
    fn test_display() {
        assert_eq!(AddressFamily::IPv4.to_string(), "ipv4");
        assert_eq!(AddressFamily::IPv6.to_string(), "ipv6");
    }
}
