//! Longest-prefix match of IP addresses against registered networks.
//!
//! IPv4 and IPv6 networks share a single binary tree keyed over the 128-bit
//! IPv6 address space; IPv4 addresses are placed at `::ffff:0:0/96`. Each key
//! bit is one tree level, so every operation is bounded by the key width and
//! does not depend on the number of registered networks.
//!
//! ```
//! use netmatch::Trie;
//! use std::net::Ipv4Addr;
//!
//! let mut acl = Trie::new();
//! acl.add_network("10.0.0.0/8", "A").unwrap();
//! acl.add_network("10.1.0.0/16", "B").unwrap();
//!
//! assert_eq!(acl.lookup_addr(Ipv4Addr::new(10, 1, 2, 3)), Some(&"B"));
//! assert_eq!(acl.lookup_addr(Ipv4Addr::new(10, 2, 3, 4)), Some(&"A"));
//! assert_eq!(acl.lookup_addr(Ipv4Addr::new(11, 0, 0, 0)), None);
//! ```
//!
//! `Trie` has no internal locking. Share it behind a lock of the caller's
//! choosing when it is mutated concurrently.

pub mod error;
pub use error::{NetmatchError, Result};

pub mod key;
pub use key::{IPV4_MAPPED_OFFSET, KEY_BITS, Key, key, network_key, parse_network};

pub mod trie;
pub use trie::{MAX_PREFIX_LEN, Trie};
