use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::IpNet;

use crate::{NetmatchError, Result};

/// Width of a key in bits.
pub const KEY_BITS: u8 = 128;

/// Bit offset at which an IPv4 address is embedded in the key space.
pub const IPV4_MAPPED_OFFSET: u8 = 96;

const BIT_MASK: [u8; 8] = [0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x01];

/// 128-bit trie key. IPv4 addresses are stored in their IPv4-mapped IPv6
/// form (`::ffff:a.b.c.d`) so both families share one tree.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key([u8; 16]);

impl Key {
    pub const fn octets(&self) -> [u8; 16] {
        self.0
    }

    /// Most significant bit first. `bit` must be below `KEY_BITS`.
    #[inline(always)]
    pub fn is_bit_set(&self, bit: u8) -> bool {
        let offset = (bit / 8) as usize;
        self.0[offset] & BIT_MASK[(bit % 8) as usize] != 0
    }
}

impl From<[u8; 16]> for Key {
    fn from(octets: [u8; 16]) -> Self {
        Key(octets)
    }
}

impl From<Ipv4Addr> for Key {
    fn from(addr: Ipv4Addr) -> Self {
        Key(addr.to_ipv6_mapped().octets())
    }
}

impl From<Ipv6Addr> for Key {
    fn from(addr: Ipv6Addr) -> Self {
        Key(addr.octets())
    }
}

impl From<IpAddr> for Key {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(addr) => addr.into(),
            IpAddr::V6(addr) => addr.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Ipv6Addr::from(self.0), f)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self)
    }
}

pub fn key(addr: impl Into<IpAddr>) -> Key {
    Key::from(addr.into())
}

/// Key and prefix length of an already parsed network. Host bits are
/// cleared and IPv4 lengths are shifted into the 128-bit key space.
pub fn network_key(net: &IpNet) -> (Key, u8) {
    match net.trunc() {
        IpNet::V4(net) => (
            Key::from(net.network()),
            net.prefix_len() + IPV4_MAPPED_OFFSET,
        ),
        IpNet::V6(net) => (Key::from(net.network()), net.prefix_len()),
    }
}

/// Parse CIDR text such as `10.0.0.0/8` or `2001:db8::/32`.
pub fn parse_network(network: &str) -> Result<(Key, u8)> {
    let net: IpNet = network
        .parse()
        .map_err(|e| NetmatchError::malformed_cidr(network, e))?;
    Ok(network_key(&net))
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    fn v4(s: &str) -> Key {
        key(s.parse::<Ipv4Addr>().unwrap())
    }

    fn v6(s: &str) -> Key {
        key(s.parse::<Ipv6Addr>().unwrap())
    }

    #[test]
    fn ipv4_is_mapped() {
        assert_eq!(
            v4("10.0.0.1").octets(),
            hex!("00000000 00000000 0000ffff 0a000001")
        );
    }

    #[test]
    fn ipv6_is_unchanged() {
        assert_eq!(
            v6("2001:db8::1").octets(),
            hex!("20010db8 00000000 00000000 00000001")
        );
    }

    #[test]
    fn ipv4_equals_mapped_ipv6() {
        assert_eq!(v4("10.0.0.0"), v6("::ffff:10.0.0.0"));
    }

    #[test]
    fn ip_addr_dispatch() {
        let addr: IpAddr = "192.168.1.1".parse().unwrap();
        assert_eq!(Key::from(addr), v4("192.168.1.1"));
        let addr: IpAddr = "fe80::1".parse().unwrap();
        assert_eq!(Key::from(addr), v6("fe80::1"));
    }

    #[test]
    fn bit_order() {
        let key = Key::from(hex!("80000000 00000000 00000000 00000001"));
        assert!(key.is_bit_set(0));
        assert!(!key.is_bit_set(1));
        assert!(!key.is_bit_set(126));
        assert!(key.is_bit_set(127));

        let key = v4("10.0.0.0");
        // 0x0a = 0b0000_1010 at byte 12.
        assert!(!key.is_bit_set(96));
        assert!(key.is_bit_set(100));
        assert!(!key.is_bit_set(101));
        assert!(key.is_bit_set(102));
    }

    #[test]
    fn display() {
        assert_eq!(v4("10.0.0.0").to_string(), "::ffff:10.0.0.0");
        assert_eq!(v6("2001:db8::").to_string(), "2001:db8::");
        assert_eq!(format!("{:?}", Key::default()), "Key(::)");
    }

    #[test]
    fn parse_ipv4_network() {
        let (key, len) = parse_network("10.0.0.0/8").unwrap();
        assert_eq!(key, v4("10.0.0.0"));
        assert_eq!(len, 104);

        let (_, len) = parse_network("0.0.0.0/0").unwrap();
        assert_eq!(len, 96);
    }

    #[test]
    fn parse_ipv6_network() {
        let (key, len) = parse_network("2001:db8::/32").unwrap();
        assert_eq!(key, v6("2001:db8::"));
        assert_eq!(len, 32);
    }

    #[test]
    fn parse_clears_host_bits() {
        let (key, len) = parse_network("10.1.2.3/16").unwrap();
        assert_eq!(key, v4("10.1.0.0"));
        assert_eq!(len, 112);

        let (key, _) = parse_network("2001:db8::ff/64").unwrap();
        assert_eq!(key, v6("2001:db8::"));
    }

    #[test]
    fn parse_malformed() {
        for input in ["", "10.0.0.0", "10.0.0.0/33", "2001:db8::/129", "foo/8"] {
            let err = parse_network(input).unwrap_err();
            assert!(
                matches!(err, NetmatchError::MalformedCidr { input: ref i, .. } if i == input),
                "{input}: {err}"
            );
        }
    }
}
