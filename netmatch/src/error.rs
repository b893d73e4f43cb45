use thiserror::Error;

use crate::Key;

#[derive(Error, Debug)]
pub enum NetmatchError {
    /// Prefix length outside of the range the trie accepts.
    #[error("Invalid prefix length: {length} (max {max})", max = crate::MAX_PREFIX_LEN)]
    InvalidLength { length: u8 },

    /// Remove target is not registered.
    #[error("Prefix {key}/{length} is not contained")]
    NotContained { key: Key, length: u8 },

    /// Add target already carries a payload.
    #[error("Prefix {key}/{length} is already present")]
    AlreadyPresent { key: Key, length: u8 },

    /// Network text rejected by the address parser.
    #[error("Malformed CIDR {input:?}: {source}")]
    MalformedCidr {
        input: String,
        #[source]
        source: ipnet::AddrParseError,
    },
}

impl NetmatchError {
    pub fn not_contained(key: &Key, length: u8) -> Self {
        Self::NotContained { key: *key, length }
    }

    pub fn already_present(key: &Key, length: u8) -> Self {
        Self::AlreadyPresent { key: *key, length }
    }

    pub fn malformed_cidr(input: impl Into<String>, source: ipnet::AddrParseError) -> Self {
        Self::MalformedCidr {
            input: input.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, NetmatchError>;
