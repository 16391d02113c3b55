//! Network selection: subdirectory name + wire magic per network.
//!
//! The network value pins two things at once:
//! - the fixed subdirectory name under the base path ({base}/mainnet etc.);
//! - the 4-byte magic every flat-file record is framed with.
//!
//! Unrecognized names are a configuration error (no default guessing at the
//! library level; the CLI applies its own default).

use std::fmt;
use std::str::FromStr;

use crate::errors::RecoverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// Fixed subdirectory name for this network under the base path.
    pub fn subdir(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }

    /// Wire magic stored in every flat-file record header.
    pub fn magic(self) -> u32 {
        match self {
            Network::Mainnet => 0xD9B4_BEF9,
            Network::Testnet => 0x0709_110B,
        }
    }
}

impl FromStr for Network {
    type Err = RecoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(RecoverError::UnknownNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subdir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_networks() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
    }

    #[test]
    fn parse_unknown_network_is_config_error() {
        let err = "regtest".parse::<Network>().unwrap_err();
        assert!(matches!(err, RecoverError::UnknownNetwork(s) if s == "regtest"));
    }

    #[test]
    fn magics_differ() {
        assert_ne!(Network::Mainnet.magic(), Network::Testnet.magic());
    }
}
