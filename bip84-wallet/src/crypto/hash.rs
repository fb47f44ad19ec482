//! Hash primitives used by the derivation pipeline

use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};

use crate::error::{Error, Result};

/// SHA-256 digest
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice, as used by Base58Check checksums
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD-160(SHA-256(data)), the witness program of a P2WPKH output
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}

/// HMAC-SHA512 keyed hash
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<[u8; 64]> {
    let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(key)
        .map_err(|_| Error::InvalidInput("HMAC key rejected".to_string()))?;
    mac.update(data);
    let mut output = [0u8; 64];
    output.copy_from_slice(&mac.finalize().into_bytes());
    Ok(output)
}

/// Split a 512-bit digest into its left and right 256-bit halves
pub fn split_digest(digest: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&digest[..32]);
    right.copy_from_slice(&digest[32..]);
    (left, right)
}
