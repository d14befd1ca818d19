use modulr_crypto::CryptoError;
use modulr_node_client::NodeError;
use modulr_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Failures of the vault envelope format and its cryptography.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("unsupported vault format (v={version}, kdf={kdf})")]
    UnsupportedFormat { version: u32, kdf: String },

    /// Wrong password or modified envelope. The two are indistinguishable.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("malformed vault envelope: {0}")]
    Malformed(String),

    #[error(transparent)]
    Crypto(CryptoError),
}

impl From<CryptoError> for VaultError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::AuthenticationFailed => VaultError::AuthenticationFailed,
            CryptoError::InvalidLength { .. } => VaultError::Malformed(e.to_string()),
            other => VaultError::Crypto(other),
        }
    }
}

/// Error classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognized envelope version/KDF or undecodable contents.
    Format,
    /// Wrong password or tampered ciphertext; re-prompt.
    Authentication,
    /// Bad user input: mnemonic, seed length, address, URL.
    Validation,
    /// No vault exists yet; route to first-run setup.
    NotFound,
    /// Node unreachable or rejecting; retry is the caller's call.
    Network,
    /// The operation needs an unlocked wallet.
    Locked,
    /// The storage backend failed.
    Storage,
    /// A primitive failed unexpectedly. Treat as a defect.
    Fatal,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Crypto(CryptoError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("node error: {0}")]
    Node(#[from] NodeError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no vault found")]
    NoVault,

    #[error("a vault already exists")]
    VaultExists,

    #[error("wallet is locked")]
    Locked,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error("no account selected")]
    NoAccountSelected,

    #[error("invalid account record: {0}")]
    InvalidAccount(String),

    #[error("invalid node URL: {0}")]
    InvalidNodeUrl(String),

    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),

    #[error("wallet state is corrupt: {0}")]
    CorruptState(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<CryptoError> for WalletError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::AuthenticationFailed => VaultError::AuthenticationFailed.into(),
            other => WalletError::Crypto(other),
        }
    }
}

fn crypto_kind(e: &CryptoError) -> ErrorKind {
    match e {
        CryptoError::InvalidMnemonic(_)
        | CryptoError::InvalidSeedLength(_)
        | CryptoError::InvalidDerivationPath(_)
        | CryptoError::InvalidLength { .. }
        | CryptoError::CircularReference => ErrorKind::Validation,
        CryptoError::AuthenticationFailed => ErrorKind::Authentication,
        CryptoError::DerivationFailed(_)
        | CryptoError::RandomnessUnavailable(_)
        | CryptoError::Kdf(_)
        | CryptoError::Encryption(_)
        | CryptoError::Serialization(_) => ErrorKind::Fatal,
    }
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::Vault(VaultError::UnsupportedFormat { .. })
            | WalletError::Vault(VaultError::Malformed(_))
            | WalletError::CorruptState(_) => ErrorKind::Format,
            WalletError::Vault(VaultError::AuthenticationFailed) => ErrorKind::Authentication,
            WalletError::Vault(VaultError::Crypto(e)) | WalletError::Crypto(e) => crypto_kind(e),
            WalletError::Store(_) => ErrorKind::Storage,
            WalletError::Node(_) => ErrorKind::Network,
            WalletError::NoVault => ErrorKind::NotFound,
            WalletError::Locked => ErrorKind::Locked,
            WalletError::Config(_)
            | WalletError::VaultExists
            | WalletError::InvalidAddress(_)
            | WalletError::UnknownAccount(_)
            | WalletError::NoAccountSelected
            | WalletError::InvalidAccount(_)
            | WalletError::InvalidNodeUrl(_)
            | WalletError::InvalidTransfer(_) => ErrorKind::Validation,
            WalletError::Serialization(_) => ErrorKind::Fatal,
        }
    }
}
