//! Cryptographic primitives and operations
//!
//! This module provides mnemonic validation and seed stretching, last-word
//! completion, BIP-32 key derivation, and the encodings used to present keys.

pub mod hash;
pub mod ec;
pub mod base58;
pub mod wordlist;
pub mod mnemonic;
pub mod completion;
pub mod keys;

pub use wordlist::Wordlist;
pub use mnemonic::*;
pub use completion::{complete_mnemonic, complete_words, Completion};
pub use keys::*;
