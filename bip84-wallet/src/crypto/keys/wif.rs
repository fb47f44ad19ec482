//! Wallet Import Format

use serde::Serialize;

use crate::config::Network;
use crate::crypto::{base58, ec};
use crate::error::{Error, Result};

/// Suffix byte marking a key whose public key should be compressed
const COMPRESSED_FLAG: u8 = 0x01;

/// A decoded WIF private key
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct WifKey {
    pub version: u8,
    pub network: Network,
    #[serde(with = "hex_bytes")]
    pub private_key: [u8; 32],
    pub compressed: bool,
}

impl std::fmt::Debug for WifKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifKey")
            .field("version", &self.version)
            .field("network", &self.network)
            .field("compressed", &self.compressed)
            .finish_non_exhaustive()
    }
}

mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }
}

/// Encode a 32-byte private key as WIF
pub fn encode(private_key: &[u8], compressed: bool, network: Network) -> Result<String> {
    if private_key.len() != ec::PRIVATE_KEY_LEN {
        return Err(Error::InvalidKeyFormat(format!(
            "private key must be {} bytes, got {}",
            ec::PRIVATE_KEY_LEN,
            private_key.len()
        )));
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(private_key);
    if !ec::is_valid_private_key(&key) {
        return Err(Error::InvalidKeyFormat("private key is zero or not below the curve order".to_string()));
    }

    let mut payload = Vec::with_capacity(34);
    payload.push(network.wif_version());
    payload.extend_from_slice(private_key);
    if compressed {
        payload.push(COMPRESSED_FLAG);
    }
    Ok(base58::check_encode(&payload))
}

/// Encode a hex private key as WIF, with or without a `0x` prefix
pub fn encode_hex(private_key_hex: &str, compressed: bool, network: Network) -> Result<String> {
    let digits = private_key_hex.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    let bytes = hex::decode(digits)?;
    encode(&bytes, compressed, network)
}

/// Decode a WIF string
pub fn decode(wif: &str) -> Result<WifKey> {
    let payload = base58::check_decode(wif.trim())?;

    let compressed = match payload.len() {
        33 => false,
        34 if payload[33] == COMPRESSED_FLAG => true,
        34 => {
            return Err(Error::InvalidKeyFormat(format!(
                "unexpected compression flag 0x{:02x}",
                payload[33]
            )))
        }
        n => return Err(Error::InvalidKeyFormat(format!("WIF payload has {} bytes", n))),
    };

    let version = payload[0];
    let network = Network::from_wif_version(version)
        .ok_or_else(|| Error::InvalidKeyFormat(format!("unknown WIF version 0x{:02x}", version)))?;

    let mut private_key = [0u8; 32];
    private_key.copy_from_slice(&payload[1..33]);
    if !ec::is_valid_private_key(&private_key) {
        return Err(Error::InvalidKeyFormat("private key is out of range".to_string()));
    }

    Ok(WifKey {
        version,
        network,
        private_key,
        compressed,
    })
}
