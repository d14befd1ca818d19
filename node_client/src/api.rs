//! The node interface the wallet consumes, and its response types.

use async_trait::async_trait;
use modulr_types::{SignedTransaction, TxId};
use serde::{Deserialize, Serialize};

use crate::NodeError;

/// Balance and last-used nonce of an account, as reported by the node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub balance: u64,
    pub nonce: u64,
}

/// Inclusion receipt of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub success: bool,
    pub block: u64,
    pub position: u64,
}

/// Result of looking a transaction up by id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TxLookup {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<TxReceipt>,
}

impl TxLookup {
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Interpret a lookup response body.
    ///
    /// The node answers either `{ "found": false }` or
    /// `{ "transaction": {...}, "receipt": {...} }` (with or without an
    /// explicit `found`).
    pub fn from_response(body: serde_json::Value) -> Result<Self, NodeError> {
        let explicit = body.get("found").and_then(serde_json::Value::as_bool);
        let transaction = body.get("transaction").filter(|t| !t.is_null()).cloned();
        let receipt = match body.get("receipt").filter(|r| !r.is_null()) {
            Some(r) => Some(
                serde_json::from_value(r.clone())
                    .map_err(|e| NodeError::InvalidResponse(format!("receipt: {e}")))?,
            ),
            None => None,
        };
        let found = explicit.unwrap_or(transaction.is_some());
        if !found {
            return Ok(Self::not_found());
        }
        Ok(Self {
            found,
            transaction,
            receipt,
        })
    }
}

/// Operations the wallet needs from a node.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// `GET /account/{id}`.
    async fn fetch_account(&self, account: &str) -> Result<AccountState, NodeError>;

    /// `POST /transaction`. Returns the node's acknowledgement body.
    async fn submit_transaction(
        &self,
        tx: &SignedTransaction,
    ) -> Result<serde_json::Value, NodeError>;

    /// `GET /transaction/{id}`. A missing transaction is `found = false`,
    /// not an error.
    async fn fetch_transaction(&self, id: &TxId) -> Result<TxLookup, NodeError>;
}
