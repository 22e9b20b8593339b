//! Error types for the Paperseal core library

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Fewer shares were supplied than the reconstruction threshold
    #[error("Insufficient shares: got {got}, need {need}")]
    InsufficientShares { got: usize, need: usize },

    /// Two shares carry the same x-index
    #[error("Duplicate share index: {0}")]
    DuplicateShare(u8),

    /// A share is malformed (zero index, wrong length, mismatched threshold)
    #[error("Invalid share: {0}")]
    InvalidShare(String),

    /// AEAD verification failed: ciphertext, nonce, and key do not match
    #[error("Authentication failed: ciphertext does not match key and nonce")]
    AuthenticationFailed,

    /// Invalid split parameters (threshold/share-count out of range)
    #[error("Invalid threshold parameters: {0}")]
    InvalidThreshold(String),

    /// Question set failed creation-time validation
    #[error("Invalid question set: {0}")]
    InvalidQuestions(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
