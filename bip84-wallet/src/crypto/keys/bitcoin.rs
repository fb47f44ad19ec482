//! Native SegWit (P2WPKH) addresses

use bitcoin_bech32::{u5, WitnessProgram};

use crate::config::Network;
use crate::crypto::{ec, hash::hash160};
use crate::error::{Error, Result};

/// Witness version for P2WPKH
const WITNESS_VERSION: u8 = 0;

/// Length of a P2WPKH witness program
const PUBKEY_HASH_LEN: usize = 20;

/// Encode a compressed public key as a P2WPKH bech32 address
pub fn encode_p2wpkh(public_key: &[u8], network: Network) -> Result<String> {
    if public_key.len() != ec::COMPRESSED_PUBLIC_KEY_LEN {
        return Err(Error::InvalidInput(format!(
            "P2WPKH requires a {}-byte compressed public key, got {} bytes",
            ec::COMPRESSED_PUBLIC_KEY_LEN,
            public_key.len()
        )));
    }
    encode_pubkey_hash(&hash160(public_key), network)
}

/// Encode a 20-byte public key hash as a P2WPKH bech32 address
pub fn encode_pubkey_hash(pubkey_hash: &[u8; 20], network: Network) -> Result<String> {
    let version = u5::try_from_u8(WITNESS_VERSION)
        .map_err(|e| Error::EncodingError(format!("invalid witness version: {}", e)))?;
    let program = WitnessProgram::new(version, pubkey_hash.to_vec(), network.to_bech32_network())
        .map_err(|e| Error::EncodingError(format!("invalid witness program: {}", e)))?;
    Ok(program.to_address())
}

/// Decode a P2WPKH address for `network` into its public key hash
pub fn decode_p2wpkh(address: &str, network: Network) -> Result<[u8; 20]> {
    let program = WitnessProgram::from_address(address)
        .map_err(|e| Error::EncodingError(format!("invalid bech32 address: {}", e)))?;

    if program.version().to_u8() != WITNESS_VERSION {
        return Err(Error::EncodingError(format!(
            "expected witness version 0, got {}",
            program.version().to_u8()
        )));
    }
    if program.program().len() != PUBKEY_HASH_LEN {
        return Err(Error::EncodingError(format!(
            "expected a {}-byte program, got {}",
            PUBKEY_HASH_LEN,
            program.program().len()
        )));
    }

    let hrp = address
        .rsplit_once('1')
        .map(|(hrp, _)| hrp.to_ascii_lowercase())
        .unwrap_or_default();
    if hrp != network.bech32_hrp() {
        return Err(Error::EncodingError(format!(
            "address prefix {:?} is not {:?} for {}",
            hrp,
            network.bech32_hrp(),
            network
        )));
    }

    let mut hash = [0u8; PUBKEY_HASH_LEN];
    hash.copy_from_slice(program.program());
    Ok(hash)
}
