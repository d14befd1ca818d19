//! Nullable node: a scripted stand-in for the node REST API.

use async_trait::async_trait;
use modulr_node_client::{AccountState, NodeApi, NodeError, TxLookup};
use modulr_types::{SignedTransaction, TxId};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
struct Script {
    accounts: HashMap<String, AccountState>,
    account_delays: HashMap<String, Duration>,
    transactions: HashMap<TxId, TxLookup>,
    submitted: Vec<SignedTransaction>,
    reject_submissions: Option<String>,
    submit_delay: Option<Duration>,
    unreachable: bool,
    account_fetches: usize,
}

/// A test node that answers from scripted state and records submissions.
///
/// Unknown accounts report HTTP 404, unknown transactions `found = false`.
#[derive(Debug, Default)]
pub struct NullNode {
    script: Mutex<Script>,
}

impl NullNode {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut guard = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn set_account(&self, account: &str, state: AccountState) {
        self.with(|s| s.accounts.insert(account.to_string(), state));
    }

    /// Delay answers for `account` (to hold a refresh in flight).
    pub fn set_account_delay(&self, account: &str, delay: Duration) {
        self.with(|s| s.account_delays.insert(account.to_string(), delay));
    }

    pub fn set_transaction(&self, id: TxId, lookup: TxLookup) {
        self.with(|s| s.transactions.insert(id, lookup));
    }

    /// Reject every submission with HTTP 400 and `reason` as the body.
    pub fn reject_submissions(&self, reason: Option<&str>) {
        self.with(|s| s.reject_submissions = reason.map(str::to_string));
    }

    pub fn set_submit_delay(&self, delay: Option<Duration>) {
        self.with(|s| s.submit_delay = delay);
    }

    /// Fail every call as if the node could not be reached.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.with(|s| s.unreachable = unreachable);
    }

    /// Transactions accepted so far, oldest first.
    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.with(|s| s.submitted.clone())
    }

    pub fn account_fetches(&self) -> usize {
        self.with(|s| s.account_fetches)
    }
}

fn unreachable_error() -> NodeError {
    NodeError::Request("connection refused".into())
}

#[async_trait]
impl NodeApi for NullNode {
    async fn fetch_account(&self, account: &str) -> Result<AccountState, NodeError> {
        let (delay, unreachable) = self.with(|s| {
            s.account_fetches += 1;
            (s.account_delays.get(account).copied(), s.unreachable)
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if unreachable {
            return Err(unreachable_error());
        }
        // Read after the delay so a test can change the answer meanwhile.
        self.with(|s| s.accounts.get(account).copied())
            .ok_or_else(|| NodeError::Status {
                status: 404,
                body: "Account not found".into(),
            })
    }

    async fn submit_transaction(
        &self,
        tx: &SignedTransaction,
    ) -> Result<serde_json::Value, NodeError> {
        let delay = self.with(|s| s.submit_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.with(|s| {
            if s.unreachable {
                return Err(unreachable_error());
            }
            if let Some(reason) = &s.reject_submissions {
                return Err(NodeError::Status {
                    status: 400,
                    body: reason.clone(),
                });
            }
            s.submitted.push(tx.clone());
            Ok(serde_json::json!({ "accepted": true }))
        })
    }

    async fn fetch_transaction(&self, id: &TxId) -> Result<TxLookup, NodeError> {
        self.with(|s| {
            if s.unreachable {
                return Err(unreachable_error());
            }
            Ok(s.transactions.get(id).cloned().unwrap_or_else(TxLookup::not_found))
        })
    }
}
