//! Error types for the bip84-wallet library

use thiserror::Error;

/// Custom error type for bip84-wallet operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Unknown word: {0}")]
    UnknownWord(String),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// The child at this index is unusable; BIP-32 says to move on to the next index.
    #[error("Invalid child key at index {index}")]
    InvalidChild { index: u32 },

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Checksum mismatch")]
    ChecksumMismatch,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for bip84-wallet operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidKeyFormat(format!("invalid hex: {}", e))
    }
}
