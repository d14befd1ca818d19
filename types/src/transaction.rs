//! Transfer transaction data: the unsigned draft and the signed form handed
//! to the node.

use serde::{Deserialize, Serialize};

use crate::{Signature, Value};

/// Protocol version of transfer transactions.
pub const TRANSFER_VERSION: u32 = 1;

/// The `type` tag of a transfer.
pub const TRANSFER_TYPE: &str = "transfer";

/// An unsigned transfer.
///
/// `from` and `to` are base58 public keys. `payload` is always a detached
/// tree (no shared nodes) once produced by the transaction builder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    #[serde(rename = "v")]
    pub version: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub fee: u64,
    pub nonce: u64,
    pub payload: Value,
}

/// A draft plus its detached signature, in the JSON shape the node accepts:
/// `{ v, type, from, to, amount, fee, nonce, payload, sig }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub draft: TransactionDraft,
    pub sig: Signature,
}
