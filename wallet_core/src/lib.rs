//! Wallet core library for Modulr.
//!
//! Provides everything a wallet application needs below its UI:
//! - Password vault: PBKDF2 + AES-256-GCM envelope around the wallet state
//! - Accounts: random or BIP39-recoverable ed25519 keys
//! - Session unlock cache with a bounded TTL
//! - Transfer building and signing
//! - The [`Wallet`] controller: lifecycle, persistence, node interaction
//! - Configuration and logging setup for host applications

pub mod account;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod state;
pub mod transaction_builder;
pub mod vault;
pub mod wallet;

pub use account::{Account, AccountKind};
pub use config::{ConfigError, WalletConfig};
pub use error::{ErrorKind, VaultError, WalletError};
pub use logging::{init_logging, LogFormat};
pub use session::SessionKeyCache;
pub use state::{Settings, TxPatch, TxRecord, TxStatus, WalletState, DEFAULT_NODE_URL};
pub use transaction_builder::{build_transfer, BuiltTransfer, SignatureTarget, SIGNATURE_TARGET};
pub use vault::{Vault, VaultEnvelope};
pub use wallet::{
    HttpConnector, NodeConnector, RefreshOutcome, StaticConnector, Wallet, WalletStatus,
};
