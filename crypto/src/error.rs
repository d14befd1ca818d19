//! Errors raised by the cryptographic primitives.

use modulr_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    #[error("invalid seed length: expected 32 bytes, got {0}")]
    InvalidSeedLength(usize),

    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    #[error("key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("circular reference in canonical value")]
    CircularReference,

    #[error("secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    #[error("password key derivation failed: {0}")]
    Kdf(String),

    #[error("invalid {what} length: expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Authenticated decryption failed. Deliberately carries no detail: a
    /// wrong key and a tampered ciphertext are indistinguishable.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<TypesError> for CryptoError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::InvalidSeedLength(len) => CryptoError::InvalidSeedLength(len),
            TypesError::CircularReference => CryptoError::CircularReference,
            other => CryptoError::Serialization(other.to_string()),
        }
    }
}
