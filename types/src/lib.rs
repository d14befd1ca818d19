//! Fundamental types for the Modulr wallet core.
//!
//! This crate defines the plain data shared by every other crate in the
//! workspace: key material, signatures, transaction ids, timestamps, the
//! canonical payload value, and transfer transactions. It performs no
//! cryptography itself.

pub mod error;
pub mod hash;
pub mod keys;
pub mod time;
pub mod transaction;
pub mod value;

pub use error::TypesError;
pub use hash::TxId;
pub use keys::{KeyPair, PublicKey, SecretSeed, Signature};
pub use time::{Clock, SystemClock, Timestamp};
pub use transaction::{SignedTransaction, TransactionDraft, TRANSFER_TYPE, TRANSFER_VERSION};
pub use value::{Number, SharedValue, Value};
