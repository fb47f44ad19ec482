//! Account-level derivation
//!
//! Turns a validated mnemonic into the BIP-84 account and its receive
//! addresses, each with a public key and a WIF private key.

mod wallet;

pub use wallet::*;
