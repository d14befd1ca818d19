//! Parse and validation errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid seed length: expected 32 bytes, got {0}")]
    InvalidSeedLength(usize),

    #[error("invalid base64 encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid transaction id: {0}")]
    InvalidTxId(String),

    #[error("circular reference in value")]
    CircularReference,
}
