//! ABI sources, storage and encoding.

pub mod codec;
pub mod store;

use std::fmt;

use alloy_primitives::Address;

pub use codec::{decode_return, encode_call, encode_constructor, format_value};
pub use store::{abi_key, AbiStore};

/// Where the ABI for an encode/decode comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiSource {
    /// Saved under a compiled object name
    ByName(String),
    /// Named explicitly by the job: a file path or a saved name
    ByOverride(String),
    /// Saved under the address a contract was deployed to
    ByAddress(Address),
}

impl AbiSource {
    /// Source for a call job: the override if any, else the destination.
    pub fn for_call(abi_override: &str, destination: &str) -> Self {
        if !abi_override.trim().is_empty() {
            return AbiSource::ByOverride(abi_override.trim().to_string());
        }
        match destination.trim().parse::<Address>() {
            Ok(address) => AbiSource::ByAddress(address),
            Err(_) => AbiSource::ByName(destination.trim().to_string()),
        }
    }
}

impl fmt::Display for AbiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiSource::ByName(name) => write!(f, "{}", name),
            AbiSource::ByOverride(abi) => write!(f, "{} (override)", abi),
            AbiSource::ByAddress(address) => write!(f, "{}", address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_beats_destination() {
        let src = AbiSource::for_call("erc20.json", "0x00000000000000000000000000000000000000aa");
        assert_eq!(src, AbiSource::ByOverride("erc20.json".to_string()));
    }

    #[test]
    fn test_address_destination() {
        let src = AbiSource::for_call("", "0x00000000000000000000000000000000000000aa");
        assert!(matches!(src, AbiSource::ByAddress(_)));
    }

    #[test]
    fn test_named_destination() {
        let src = AbiSource::for_call("  ", "Token");
        assert_eq!(src, AbiSource::ByName("Token".to_string()));
    }
}
