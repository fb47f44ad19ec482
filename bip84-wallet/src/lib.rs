//! BIP84 Wallet - native SegWit key derivation
//!
//! This library validates BIP-39 mnemonics and stretches them into seeds,
//! derives BIP-32 keys along m/84'/0'/0'/0/i, and renders each key as a bech32
//! P2WPKH address, a compressed public key and a WIF private key. It can also
//! list every word that completes a mnemonic missing its last word.

pub mod error;
pub mod config;
pub mod crypto;
pub mod account;

// Re-export commonly used types for convenience
pub use account::{derive_addresses, Bip84Account, DerivedAddress};
pub use config::{Network, WalletConfig};
pub use crypto::{Completion, Wordlist};
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
