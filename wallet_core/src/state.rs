//! The plaintext wallet state sealed inside the vault.

use modulr_types::{PublicKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::account::Account;
use crate::error::WalletError;

/// Wallet state format version.
pub const STATE_VERSION: u32 = 1;

/// Node endpoint for new wallets.
pub const DEFAULT_NODE_URL: &str = "http://localhost:7332";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Signed and recorded locally, not yet accepted by a node.
    Created,
    Submitted,
    Failed,
}

/// Local history entry for a transfer this wallet signed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    /// Hex transaction id.
    pub id: String,
    pub time: Timestamp,
    pub status: TxStatus,
    pub node_url: String,
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub fee: u64,
    pub nonce: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Partial update of a [`TxRecord`]. `None` fields are left alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TxPatch {
    pub status: Option<TxStatus>,
    pub sig: Option<Signature>,
    pub error: Option<String>,
}

impl TxPatch {
    pub fn submitted() -> Self {
        Self {
            status: Some(TxStatus::Submitted),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(TxStatus::Failed),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn apply(&self, record: &mut TxRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(sig) = self.sig {
            record.sig = Some(sig);
        }
        if let Some(error) = &self.error {
            record.error = Some(error.clone());
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub node_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub v: u32,
    pub created_at: Timestamp,
    pub selected_account_id: Option<String>,
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub txs: Vec<TxRecord>,
    #[serde(default)]
    pub settings: Settings,
}

impl WalletState {
    /// An empty wallet with no accounts.
    pub fn new(created_at: Timestamp, node_url: impl Into<String>) -> Self {
        Self {
            v: STATE_VERSION,
            created_at,
            selected_account_id: None,
            accounts: Vec::new(),
            txs: Vec::new(),
            settings: Settings {
                node_url: node_url.into(),
            },
        }
    }

    /// Parse decrypted vault contents.
    pub fn from_json(bytes: &[u8]) -> Result<Self, WalletError> {
        let state: Self =
            serde_json::from_slice(bytes).map_err(|e| WalletError::CorruptState(e.to_string()))?;
        if state.v != STATE_VERSION {
            return Err(WalletError::CorruptState(format!(
                "unsupported state version {}",
                state.v
            )));
        }
        Ok(state)
    }

    /// Serialize for sealing. The buffer holds seeds, so it is wiped on drop.
    pub fn to_json(&self) -> Result<Zeroizing<Vec<u8>>, WalletError> {
        serde_json::to_vec(self)
            .map(Zeroizing::new)
            .map_err(|e| WalletError::Serialization(e.to_string()))
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn selected_account(&self) -> Option<&Account> {
        self.selected_account_id
            .as_deref()
            .and_then(|id| self.account(id))
    }

    /// Append an account and select it.
    pub fn push_account(&mut self, account: Account) {
        self.selected_account_id = Some(account.id.clone());
        self.accounts.push(account);
    }

    /// Newest first.
    pub fn add_tx(&mut self, record: TxRecord) {
        self.txs.insert(0, record);
    }

    /// Patch the record with `id`. Returns false when there is none.
    pub fn update_tx(&mut self, id: &str, patch: &TxPatch) -> bool {
        match self.txs.iter_mut().find(|t| t.id == id) {
            Some(record) => {
                patch.apply(record);
                true
            }
            None => false,
        }
    }

    /// Records sent from or to `public_key`.
    pub fn transactions_for(&self, public_key: &PublicKey) -> Vec<TxRecord> {
        let address = public_key.to_base58();
        self.txs
            .iter()
            .filter(|t| t.from == address || t.to == address)
            .cloned()
            .collect()
    }
}
