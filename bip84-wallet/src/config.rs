//! Network selection and derivation settings

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Largest number of addresses that fits the non-hardened index space.
pub const MAX_ADDRESS_COUNT: u32 = 0x8000_0000;

/// Number of addresses derived when the caller does not say otherwise.
pub const DEFAULT_ADDRESS_COUNT: u32 = 10;

/// Extended key version bytes for one network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyVersions {
    /// Version for serialized private keys
    pub private: [u8; 4],
    /// Version for serialized public keys
    pub public: [u8; 4],
}

/// Supported Bitcoin networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Bitcoin mainnet
    #[default]
    Mainnet,
    /// Bitcoin testnet
    Testnet,
}

impl Network {
    /// WIF version byte
    pub fn wif_version(&self) -> u8 {
        match self {
            Self::Mainnet => 0x80,
            Self::Testnet => 0xEF,
        }
    }

    /// Bech32 human-readable prefix
    pub fn bech32_hrp(&self) -> &'static str {
        match self {
            Self::Mainnet => "bc",
            Self::Testnet => "tb",
        }
    }

    /// BIP-84 extended key versions (zprv/zpub, vprv/vpub)
    pub fn bip84_versions(&self) -> KeyVersions {
        match self {
            Self::Mainnet => KeyVersions {
                private: [0x04, 0xB2, 0x43, 0x0C],
                public: [0x04, 0xB2, 0x47, 0x46],
            },
            Self::Testnet => KeyVersions {
                private: [0x04, 0x5F, 0x18, 0xBC],
                public: [0x04, 0x5F, 0x1C, 0xF6],
            },
        }
    }

    /// Plain BIP-32 extended key versions (xprv/xpub, tprv/tpub)
    pub fn bip32_versions(&self) -> KeyVersions {
        match self {
            Self::Mainnet => KeyVersions {
                private: [0x04, 0x88, 0xAD, 0xE4],
                public: [0x04, 0x88, 0xB2, 0x1E],
            },
            Self::Testnet => KeyVersions {
                private: [0x04, 0x35, 0x83, 0x94],
                public: [0x04, 0x35, 0x87, 0xCF],
            },
        }
    }

    /// Network owning a WIF version byte
    pub fn from_wif_version(version: u8) -> Option<Self> {
        match version {
            0x80 => Some(Self::Mainnet),
            0xEF => Some(Self::Testnet),
            _ => None,
        }
    }

    pub(crate) fn to_bech32_network(self) -> bitcoin_bech32::constants::Network {
        match self {
            Self::Mainnet => bitcoin_bech32::constants::Network::Bitcoin,
            Self::Testnet => bitcoin_bech32::constants::Network::Testnet,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            other => Err(Error::Config(format!("unknown network: {}", other))),
        }
    }
}

/// Settings for an address derivation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Network for WIF version bytes and the bech32 prefix
    pub network: Network,
    /// Whether WIF strings carry the compressed-key suffix
    pub compressed: bool,
    /// Number of addresses to derive
    pub count: u32,
    /// Optional wordlist file; the built-in English list is used when unset
    pub wordlist: Option<PathBuf>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            compressed: true,
            count: DEFAULT_ADDRESS_COUNT,
            wordlist: None,
        }
    }
}

impl WalletConfig {
    /// Create configuration from environment variables
    ///
    /// Reads `BIP84_NETWORK`, `BIP84_COMPRESSED`, `BIP84_ADDRESS_COUNT` and
    /// `BIP84_WORDLIST`. Unset variables keep their defaults; set but
    /// unparseable ones are an error.
    pub fn from_env() -> Result<Self> {
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse settings from any key lookup
    ///
    /// Values are parsed but not range-checked, so a caller can override
    /// fields before calling [`WalletConfig::validate`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(network) = lookup("BIP84_NETWORK") {
            config.network = network.parse()?;
        }

        if let Some(compressed) = lookup("BIP84_COMPRESSED") {
            config.compressed = parse_bool(&compressed)
                .ok_or_else(|| Error::Config(format!("BIP84_COMPRESSED is not a boolean: {}", compressed)))?;
        }

        if let Some(count) = lookup("BIP84_ADDRESS_COUNT") {
            config.count = count
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("BIP84_ADDRESS_COUNT is not a number: {}", count)))?;
        }

        if let Some(path) = lookup("BIP84_WORDLIST") {
            if !path.trim().is_empty() {
                config.wordlist = Some(PathBuf::from(path));
            }
        }

        debug!(network = %config.network, count = config.count, compressed = config.compressed, "loaded wallet configuration");
        Ok(config)
    }

    /// Check the configuration values are usable
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(Error::Config("address count must be positive".to_string()));
        }
        if self.count > MAX_ADDRESS_COUNT {
            return Err(Error::Config(format!(
                "address count must not exceed {}",
                MAX_ADDRESS_COUNT
            )));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
