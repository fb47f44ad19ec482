//! Base58Check encoding
//!
//! Raw Base58 comes from `bs58` with the Bitcoin alphabet (no `0`, `O`, `I`
//! or `l`). The checksum is the first four bytes of double SHA-256 over the
//! payload.

use crate::crypto::hash::sha256d;
use crate::error::{Error, Result};

/// Checksum length appended by [`check_encode`]
pub const CHECKSUM_LEN: usize = 4;

/// Encode a byte slice to a Base58 string
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_string()
}

/// Decode a Base58 string
pub fn decode(s: &str) -> Result<Vec<u8>> {
    bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| Error::EncodingError(format!("invalid base58: {}", e)))
}

/// First four bytes of SHA-256d(payload)
pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let hash = sha256d(payload);
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode `payload || checksum(payload)`
pub fn check_encode(payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum(payload));
    encode(&data)
}

/// Decode and strip a verified checksum
pub fn check_decode(s: &str) -> Result<Vec<u8>> {
    let decoded = decode(s)?;
    if decoded.len() < CHECKSUM_LEN {
        return Err(Error::EncodingError("data too short for checksum".to_string()));
    }
    let (payload, sum) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    if sum != checksum(payload) {
        return Err(Error::ChecksumMismatch);
    }
    Ok(payload.to_vec())
}
