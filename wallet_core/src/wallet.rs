//! The wallet controller.
//!
//! [`Wallet`] owns the unlocked session (derived vault key + decrypted
//! [`WalletState`]) and is the only writer of the sealed vault. Every state
//! transition runs under one async lock as read, modify, reseal, persist, and
//! the in-memory state is replaced only after the new envelope is stored.

use modulr_crypto::{DerivationPath, SymmetricKey};
use modulr_node_client::{parse_node_url, AccountState, HttpNodeClient, NodeApi, NodeError, TxLookup};
use modulr_store::{KeyValueStore, SessionStore};
use modulr_types::{Clock, PublicKey, SystemClock, TxId, Value};
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::account::Account;
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::session::SessionKeyCache;
use crate::state::{TxPatch, TxRecord, TxStatus, WalletState};
use crate::transaction_builder::build_transfer;
use crate::vault::{Vault, VaultEnvelope};

// ── Node connection ─────────────────────────────────────────────────────

/// Produces a node client for the node URL currently in the wallet settings.
pub trait NodeConnector: Send + Sync {
    fn connect(&self, node_url: &str) -> Result<Arc<dyn NodeApi>, WalletError>;
}

/// Connects over HTTP with a per-request timeout.
#[derive(Clone, Copy, Debug)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl NodeConnector for HttpConnector {
    fn connect(&self, node_url: &str) -> Result<Arc<dyn NodeApi>, WalletError> {
        Ok(Arc::new(HttpNodeClient::new(node_url, self.timeout)?))
    }
}

/// Always hands out the same node, whatever the URL.
#[derive(Clone)]
pub struct StaticConnector(pub Arc<dyn NodeApi>);

impl NodeConnector for StaticConnector {
    fn connect(&self, _node_url: &str) -> Result<Arc<dyn NodeApi>, WalletError> {
        Ok(self.0.clone())
    }
}

// ── Status ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletStatus {
    /// [`Wallet::load`] has not finished.
    Loading,
    /// No vault in storage.
    NeedsOnboarding,
    Locked,
    Unlocked,
}

/// Result of [`Wallet::refresh_selected_account`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated(AccountState),
    /// A newer refresh started meanwhile; this answer was dropped.
    Superseded,
}

/// The unlocked session: the derived key and the decrypted state.
struct Session {
    key: SymmetricKey,
    state: WalletState,
}

struct Inner {
    status: WalletStatus,
    envelope: Option<VaultEnvelope>,
    session: Option<Session>,
}

#[derive(Default)]
struct RefreshTracker {
    generation: u64,
    account_state: Option<AccountState>,
}

pub struct Wallet {
    config: WalletConfig,
    vault: Vault,
    store: Arc<dyn KeyValueStore>,
    unlock_cache: SessionKeyCache,
    clock: Arc<dyn Clock>,
    nodes: Arc<dyn NodeConnector>,
    inner: Mutex<Inner>,
    refresh: StdMutex<RefreshTracker>,
}

impl Wallet {
    pub fn new(
        config: WalletConfig,
        store: Arc<dyn KeyValueStore>,
        session_store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        nodes: Arc<dyn NodeConnector>,
    ) -> Self {
        let unlock_cache = SessionKeyCache::new(
            session_store,
            clock.clone(),
            config.session_storage_key.clone(),
        );
        Self {
            vault: Vault::new(config.kdf_iterations),
            config,
            store,
            unlock_cache,
            clock,
            nodes,
            inner: Mutex::new(Inner {
                status: WalletStatus::Loading,
                envelope: None,
                session: None,
            }),
            refresh: StdMutex::new(RefreshTracker::default()),
        }
    }

    /// Production wiring: system clock and HTTP node access bounded by the
    /// configured timeout.
    pub fn with_http_node(
        config: WalletConfig,
        store: Arc<dyn KeyValueStore>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        let nodes = Arc::new(HttpConnector::new(config.node_timeout()));
        Self::new(config, store, session_store, Arc::new(SystemClock), nodes)
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub async fn status(&self) -> WalletStatus {
        self.inner.lock().await.status
    }

    /// A copy of the decrypted state, if unlocked.
    pub async fn state(&self) -> Option<WalletState> {
        self.inner
            .lock()
            .await
            .session
            .as_ref()
            .map(|s| s.state.clone())
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Read the stored vault and try the session unlock cache.
    pub async fn load(&self) -> Result<WalletStatus, WalletError> {
        let mut inner = self.inner.lock().await;
        inner.session = None;
        let Some(envelope) = self.read_envelope()? else {
            inner.envelope = None;
            inner.status = WalletStatus::NeedsOnboarding;
            tracing::info!("no vault found");
            return Ok(inner.status);
        };
        inner.envelope = Some(envelope.clone());
        inner.status = WalletStatus::Locked;

        if let Some(key) = self.unlock_cache.get()? {
            match self.open_state(&key, &envelope) {
                Ok(state) => {
                    inner.session = Some(Session { key, state });
                    inner.status = WalletStatus::Unlocked;
                    self.reset_refresh();
                    tracing::info!("vault unlocked from session cache");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "cached unlock key rejected");
                    self.unlock_cache.clear()?;
                }
            }
        }
        Ok(inner.status)
    }

    /// Create and persist a new vault holding one fresh recoverable account.
    pub async fn create_vault(&self, password: &str) -> Result<(), WalletError> {
        let mut inner = self.inner.lock().await;
        if inner.envelope.is_some() || self.read_envelope()?.is_some() {
            return Err(WalletError::VaultExists);
        }

        let mut state = WalletState::new(self.clock.now(), self.config.default_node_url.clone());
        state.push_account(Account::generate_new_default("Account 1")?);

        let plaintext = state.to_json()?;
        let (envelope, key) = self.vault.create(password, &plaintext)?;
        self.write_envelope(&envelope)?;
        self.unlock_cache.set(&key, self.config.unlock_ttl())?;

        inner.envelope = Some(envelope);
        inner.session = Some(Session { key, state });
        inner.status = WalletStatus::Unlocked;
        self.reset_refresh();
        tracing::info!(iterations = self.vault.iterations(), "vault created");
        Ok(())
    }

    pub async fn unlock(&self, password: &str) -> Result<(), WalletError> {
        let mut inner = self.inner.lock().await;
        let envelope = match inner.envelope.clone() {
            Some(envelope) => envelope,
            None => self.read_envelope()?.ok_or(WalletError::NoVault)?,
        };
        let key = self.vault.derive_raw_key(password, &envelope)?;
        let state = match self.open_state(&key, &envelope) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "unlock failed");
                return Err(e);
            }
        };
        self.unlock_cache.set(&key, self.config.unlock_ttl())?;

        inner.envelope = Some(envelope);
        inner.session = Some(Session { key, state });
        inner.status = WalletStatus::Unlocked;
        self.reset_refresh();
        tracing::info!("vault unlocked");
        Ok(())
    }

    /// Drop the session and the cached unlock key. The in-memory session is
    /// gone even if clearing the cache fails.
    pub async fn lock(&self) -> Result<(), WalletError> {
        let mut inner = self.inner.lock().await;
        inner.session = None;
        inner.status = if inner.envelope.is_some() {
            WalletStatus::Locked
        } else {
            WalletStatus::NeedsOnboarding
        };
        self.reset_refresh();
        tracing::info!("wallet locked");
        self.unlock_cache.clear()
    }

    /// Delete the vault and the cached unlock key.
    pub async fn reset(&self) -> Result<(), WalletError> {
        let mut inner = self.inner.lock().await;
        inner.session = None;
        inner.envelope = None;
        inner.status = WalletStatus::NeedsOnboarding;
        self.reset_refresh();
        let cleared = self.unlock_cache.clear();
        self.store.remove(&self.config.vault_storage_key)?;
        tracing::info!("wallet reset");
        cleared
    }

    /// Persist `next` as the new wallet state.
    pub async fn save(&self, next: WalletState) -> Result<(), WalletError> {
        let mut inner = self.inner.lock().await;
        let retarget = inner.session.as_ref().is_some_and(|session| {
            session.state.selected_account_id != next.selected_account_id
                || session.state.settings.node_url != next.settings.node_url
        });
        self.persist(&mut inner, next)?;
        if retarget {
            self.reset_refresh();
        }
        Ok(())
    }

    // ── State transitions ───────────────────────────────────────────────

    /// Add a new recoverable account and select it.
    pub async fn create_account(&self) -> Result<Account, WalletError> {
        let account = self
            .mutate_selection(|state| {
                let account =
                    Account::generate_new_default(format!("Account {}", state.accounts.len() + 1))?;
                state.push_account(account.clone());
                Ok(account)
            })
            .await?;
        tracing::info!(account = %account.id, "account created");
        Ok(account)
    }

    /// Import an account from a seed phrase on the default path and select it.
    pub async fn import_account_from_seed_phrase(
        &self,
        name: Option<&str>,
        mnemonic: &str,
        passphrase: Option<&str>,
    ) -> Result<Account, WalletError> {
        let account = self
            .mutate_selection(|state| {
                let name = match name {
                    Some(name) => name.to_string(),
                    None => format!("Imported {}", state.accounts.len() + 1),
                };
                let account = Account::generate_from_mnemonic(
                    name,
                    mnemonic,
                    passphrase.unwrap_or(""),
                    DerivationPath::DEFAULT,
                )?;
                state.push_account(account.clone());
                Ok(account)
            })
            .await?;
        tracing::info!(account = %account.id, "account imported");
        Ok(account)
    }

    pub async fn select_account(&self, account_id: &str) -> Result<(), WalletError> {
        self.mutate_selection(|state| {
            if state.account(account_id).is_none() {
                return Err(WalletError::UnknownAccount(account_id.to_string()));
            }
            state.selected_account_id = Some(account_id.to_string());
            Ok(())
        })
        .await
    }

    pub async fn set_node_url(&self, node_url: &str) -> Result<(), WalletError> {
        let node_url = node_url.trim();
        parse_node_url(node_url).map_err(|e| WalletError::InvalidNodeUrl(e.to_string()))?;
        self.mutate_selection(|state| {
            state.settings.node_url = node_url.to_string();
            Ok(())
        })
        .await?;
        tracing::info!(node_url, "node URL changed");
        Ok(())
    }

    /// Record a transaction, newest first.
    pub async fn add_tx(&self, record: TxRecord) -> Result<(), WalletError> {
        self.mutate(|state| {
            state.add_tx(record);
            Ok(())
        })
        .await
    }

    /// Patch the record with `id`. An unknown id changes nothing.
    pub async fn update_tx(&self, id: &str, patch: TxPatch) -> Result<(), WalletError> {
        self.mutate(|state| {
            if !state.update_tx(id, &patch) {
                tracing::debug!(tx = id, "update for unknown transaction ignored");
            }
            Ok(())
        })
        .await
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub async fn selected_account(&self) -> Result<Option<Account>, WalletError> {
        let inner = self.inner.lock().await;
        let session = inner.session.as_ref().ok_or(WalletError::Locked)?;
        Ok(session.state.selected_account().cloned())
    }

    /// Transactions involving the selected account (all of them when none
    /// is selected).
    pub async fn transactions(&self) -> Result<Vec<TxRecord>, WalletError> {
        let inner = self.inner.lock().await;
        let state = &inner.session.as_ref().ok_or(WalletError::Locked)?.state;
        Ok(match state.selected_account() {
            Some(account) => state.transactions_for(&account.public_key),
            None => state.txs.clone(),
        })
    }

    /// Last node answer for the selected account, if any.
    pub fn selected_account_state(&self) -> Option<AccountState> {
        self.tracker().account_state
    }

    // ── Node operations ─────────────────────────────────────────────────

    /// Fetch balance and nonce of the selected account. Only the newest
    /// request may store its answer.
    pub async fn refresh_selected_account(&self) -> Result<RefreshOutcome, WalletError> {
        // Target and generation are taken under the same state lock that
        // selection changes hold while they bump the generation.
        let (node_url, address, generation) = {
            let inner = self.inner.lock().await;
            let state = &inner.session.as_ref().ok_or(WalletError::Locked)?.state;
            let account = state
                .selected_account()
                .ok_or(WalletError::NoAccountSelected)?;
            let mut tracker = self.tracker();
            tracker.generation += 1;
            (
                state.settings.node_url.clone(),
                account.address(),
                tracker.generation,
            )
        };

        let result = match self.nodes.connect(&node_url) {
            Ok(node) => self.bounded(node.fetch_account(&address)).await,
            Err(e) => Err(e),
        };

        let mut tracker = self.tracker();
        if tracker.generation != generation {
            tracing::debug!(generation, "stale account refresh dropped");
            return Ok(RefreshOutcome::Superseded);
        }
        match result {
            Ok(state) => {
                tracker.account_state = Some(state);
                Ok(RefreshOutcome::Updated(state))
            }
            Err(e) => {
                tracker.account_state = None;
                tracing::warn!(error = %e, "account refresh failed");
                Err(e)
            }
        }
    }

    /// Sign and submit a transfer from the selected account.
    ///
    /// The record is stored as `created` before submission and then marked
    /// `submitted` or `failed`. A submission error is returned after the
    /// failure has been recorded.
    pub async fn send_transfer(
        &self,
        to: &str,
        amount: u64,
        fee: u64,
        memo: Option<&str>,
    ) -> Result<TxRecord, WalletError> {
        let to = to.trim();
        PublicKey::from_base58(to).map_err(|e| WalletError::InvalidAddress(e.to_string()))?;
        if amount == 0 {
            return Err(WalletError::InvalidTransfer("amount must be positive".into()));
        }

        let (account, node_url) = {
            let inner = self.inner.lock().await;
            let state = &inner.session.as_ref().ok_or(WalletError::Locked)?.state;
            let account = state
                .selected_account()
                .cloned()
                .ok_or(WalletError::NoAccountSelected)?;
            (account, state.settings.node_url.clone())
        };
        let from = account.address();
        let node = self.nodes.connect(&node_url)?;

        let nonce = self
            .bounded(node.fetch_account(&from))
            .await?
            .nonce
            .checked_add(1)
            .ok_or_else(|| WalletError::InvalidTransfer("nonce overflow".into()))?;

        let payload = memo
            .filter(|m| !m.is_empty())
            .map(|m| Value::map([("memo", m)]));
        let built = build_transfer(
            &from,
            to,
            amount,
            fee,
            nonce,
            payload.as_ref(),
            account.seed().as_bytes(),
        )?;

        let mut record = TxRecord {
            id: built.id.to_hex(),
            time: self.clock.now(),
            status: TxStatus::Created,
            node_url,
            from,
            to: to.to_string(),
            amount,
            fee,
            nonce,
            sig: Some(built.signature),
            error: None,
        };
        self.add_tx(record.clone()).await?;
        tracing::info!(tx = %record.id, nonce, "transfer signed");

        match self.bounded(node.submit_transaction(&built.signed)).await {
            Ok(_) => {
                self.update_tx(&record.id, TxPatch::submitted()).await?;
                record.status = TxStatus::Submitted;
                tracing::info!(tx = %record.id, "transfer submitted");
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(tx = %record.id, error = %e, "transfer submission failed");
                self.update_tx(&record.id, TxPatch::failed(e.to_string()))
                    .await?;
                Err(e)
            }
        }
    }

    /// Look a transaction up on the current node.
    pub async fn transaction_status(&self, id: &str) -> Result<TxLookup, WalletError> {
        let id = TxId::from_hex(id.trim())
            .map_err(|e| WalletError::InvalidTransfer(format!("transaction id: {e}")))?;
        let node_url = {
            let inner = self.inner.lock().await;
            let state = &inner.session.as_ref().ok_or(WalletError::Locked)?.state;
            state.settings.node_url.clone()
        };
        let node = self.nodes.connect(&node_url)?;
        self.bounded(node.fetch_transaction(&id)).await
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Apply `f` to a copy of the state and persist the result.
    async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut WalletState) -> Result<R, WalletError>,
    ) -> Result<R, WalletError> {
        let mut inner = self.inner.lock().await;
        self.apply(&mut inner, f)
    }

    /// Like [`Wallet::mutate`] for transitions that change which account or
    /// node a refresh targets. The refresh generation moves while the state
    /// lock is still held, so an in-flight refresh that read the old
    /// selection can never be the newest one.
    async fn mutate_selection<R>(
        &self,
        f: impl FnOnce(&mut WalletState) -> Result<R, WalletError>,
    ) -> Result<R, WalletError> {
        let mut inner = self.inner.lock().await;
        let out = self.apply(&mut inner, f)?;
        self.reset_refresh();
        Ok(out)
    }

    fn apply<R>(
        &self,
        inner: &mut Inner,
        f: impl FnOnce(&mut WalletState) -> Result<R, WalletError>,
    ) -> Result<R, WalletError> {
        let mut next = inner
            .session
            .as_ref()
            .ok_or(WalletError::Locked)?
            .state
            .clone();
        let out = f(&mut next)?;
        self.persist(inner, next)?;
        Ok(out)
    }

    fn persist(&self, inner: &mut Inner, next: WalletState) -> Result<(), WalletError> {
        let session = inner.session.as_mut().ok_or(WalletError::Locked)?;
        let previous = inner.envelope.as_ref().ok_or(WalletError::NoVault)?;
        let plaintext = next.to_json()?;
        let envelope = self
            .vault
            .seal_with_raw_key(&session.key, previous, &plaintext)?;
        self.write_envelope(&envelope)?;
        session.state = next;
        inner.envelope = Some(envelope);
        tracing::debug!("wallet state saved");
        Ok(())
    }

    fn open_state(
        &self,
        key: &SymmetricKey,
        envelope: &VaultEnvelope,
    ) -> Result<WalletState, WalletError> {
        let plaintext = self.vault.open_with_raw_key(key, envelope)?;
        WalletState::from_json(&plaintext)
    }

    fn read_envelope(&self) -> Result<Option<VaultEnvelope>, WalletError> {
        match self.store.get(&self.config.vault_storage_key)? {
            Some(bytes) => Ok(Some(VaultEnvelope::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_envelope(&self, envelope: &VaultEnvelope) -> Result<(), WalletError> {
        self.store
            .set(&self.config.vault_storage_key, &envelope.to_vec()?)?;
        Ok(())
    }

    fn tracker(&self) -> std::sync::MutexGuard<'_, RefreshTracker> {
        self.refresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Invalidate in-flight refreshes and forget the last account state.
    fn reset_refresh(&self) {
        let mut tracker = self.tracker();
        tracker.generation += 1;
        tracker.account_state = None;
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, NodeError>>,
    ) -> Result<T, WalletError> {
        match tokio::time::timeout(self.config.node_timeout(), fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(NodeError::Timeout.into()),
        }
    }
}
