//! secp256k1 scalar and point operations
//!
//! Thin wrappers over the `secp256k1` crate that work on fixed-width byte
//! arrays and report failures as [`Error::InvalidInput`].

use secp256k1::{All, PublicKey, Scalar, Secp256k1, SecretKey};
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Length of a serialized secret scalar
pub const PRIVATE_KEY_LEN: usize = 32;
/// Length of a compressed public key
pub const COMPRESSED_PUBLIC_KEY_LEN: usize = 33;
/// Length of an uncompressed public key
pub const UNCOMPRESSED_PUBLIC_KEY_LEN: usize = 65;

/// Order of the secp256k1 group, big-endian
pub const CURVE_ORDER: [u8; 32] = secp256k1::constants::CURVE_ORDER;

fn context() -> &'static Secp256k1<All> {
    static CONTEXT: OnceLock<Secp256k1<All>> = OnceLock::new();
    CONTEXT.get_or_init(Secp256k1::new)
}

/// Parse a secret scalar, rejecting zero and values at or above the curve order
pub fn secret_key(bytes: &[u8; 32]) -> Result<SecretKey> {
    SecretKey::from_slice(bytes)
        .map_err(|_| Error::InvalidInput("scalar is zero or not below the curve order".to_string()))
}

/// Whether the bytes are a usable secret scalar
pub fn is_valid_private_key(bytes: &[u8; 32]) -> bool {
    secret_key(bytes).is_ok()
}

/// Scalar times the base point
pub fn public_key(private_key: &[u8; 32]) -> Result<PublicKey> {
    let secret = secret_key(private_key)?;
    Ok(PublicKey::from_secret_key(context(), &secret))
}

/// Compressed (33-byte) public point for a secret scalar
pub fn public_key_compressed(private_key: &[u8; 32]) -> Result<[u8; 33]> {
    Ok(public_key(private_key)?.serialize())
}

/// Uncompressed (65-byte, 0x04 prefixed) public point for a secret scalar
pub fn public_key_uncompressed(private_key: &[u8; 32]) -> Result<[u8; 65]> {
    Ok(public_key(private_key)?.serialize_uncompressed())
}

/// Parse a public point in compressed or uncompressed form
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey> {
    PublicKey::from_slice(bytes).map_err(|_| Error::InvalidInput("point is not on the curve".to_string()))
}

/// Convert a compressed or uncompressed point to its compressed form
pub fn compress_public_key(bytes: &[u8]) -> Result<[u8; 33]> {
    Ok(parse_public_key(bytes)?.serialize())
}

/// Point addition
pub fn add_points(a: &[u8], b: &[u8]) -> Result<[u8; 33]> {
    let a = parse_public_key(a)?;
    let b = parse_public_key(b)?;
    let sum = a
        .combine(&b)
        .map_err(|_| Error::InvalidInput("points sum to infinity".to_string()))?;
    Ok(sum.serialize())
}

/// `(tweak + private_key) mod n`
///
/// Fails when the tweak is not below the curve order or the sum is zero.
pub fn add_scalars(private_key: &[u8; 32], tweak: &[u8; 32]) -> Result<[u8; 32]> {
    let secret = secret_key(private_key)?;
    let tweak = Scalar::from_be_bytes(*tweak)
        .map_err(|_| Error::InvalidInput("tweak is not below the curve order".to_string()))?;
    let sum = secret
        .add_tweak(&tweak)
        .map_err(|_| Error::InvalidInput("scalar sum is zero".to_string()))?;
    Ok(sum.secret_bytes())
}
