//! Key derivation and encoding
//!
//! BIP-32 derivation lives in [`derivation`]; [`bitcoin`] turns public keys
//! into native SegWit addresses and [`wif`] serializes private keys.

pub mod bitcoin;
pub mod wif;
mod derivation;

pub use derivation::*;
pub use wif::WifKey;
