//! End-to-end wallet tests over nullable infrastructure:
//! vault creation → session unlock cache → state transitions → node calls.
//!
//! Each `Env` shares its stores, clock and node between wallet instances, so
//! building a second `Wallet` from the same `Env` behaves like a restart.

use std::sync::Arc;
use std::time::Duration;

use modulr_crypto::verify_signature;
use modulr_node_client::AccountState;
use modulr_nullables::{NullClock, NullNode, NullStore};
use modulr_store::KeyValueStore;
use modulr_types::{Signature, Timestamp};
use modulr_wallet_core::{
    ErrorKind, RefreshOutcome, StaticConnector, TxPatch, TxRecord, TxStatus, Wallet,
    WalletConfig, WalletStatus,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const PASSWORD: &str = "correct horse battery staple";
const VAULT_KEY: &str = "modulr.vault.v1";
const SESSION_KEY: &str = "modulr.session.unlock.v1";

struct Env {
    config: WalletConfig,
    store: Arc<NullStore>,
    session: Arc<NullStore>,
    clock: Arc<NullClock>,
    node: Arc<NullNode>,
}

impl Env {
    fn new() -> Self {
        Self::with_config(WalletConfig {
            kdf_iterations: 1_000,
            ..WalletConfig::default()
        })
    }

    fn with_config(config: WalletConfig) -> Self {
        Self {
            config,
            store: Arc::new(NullStore::new()),
            session: Arc::new(NullStore::new()),
            clock: Arc::new(NullClock::new(1_700_000_000_000)),
            node: Arc::new(NullNode::new()),
        }
    }

    fn wallet(&self) -> Wallet {
        Wallet::new(
            self.config.clone(),
            self.store.clone(),
            self.session.clone(),
            self.clock.clone(),
            Arc::new(StaticConnector(self.node.clone())),
        )
    }

    async fn unlocked(&self) -> Wallet {
        let wallet = self.wallet();
        wallet.load().await.unwrap();
        wallet.create_vault(PASSWORD).await.unwrap();
        wallet
    }
}

fn record(id: &str, from: &str) -> TxRecord {
    TxRecord {
        id: id.to_string(),
        time: Timestamp::from_millis(1),
        status: TxStatus::Created,
        node_url: "http://localhost:7332".into(),
        from: from.to_string(),
        to: "peer".into(),
        amount: 1,
        fee: 0,
        nonce: 1,
        sig: None,
        error: None,
    }
}

fn recipient() -> String {
    modulr_crypto::keypair_from_seed(&modulr_types::SecretSeed::new([9u8; 32]))
        .public
        .to_base58()
}

// ---------------------------------------------------------------------------
// 1. Session unlock cache across restarts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn restart_within_ttl_is_unlocked() {
    let env = Env::new();
    let first = env.unlocked().await;
    let accounts = first.state().await.unwrap().accounts;

    let second = env.wallet();
    assert_eq!(second.load().await.unwrap(), WalletStatus::Unlocked);
    assert_eq!(second.state().await.unwrap().accounts, accounts);
}

#[tokio::test]
async fn restart_after_ttl_is_locked() {
    let env = Env::new();
    env.unlocked().await;

    env.clock.advance(Duration::from_secs(15 * 60));
    let second = env.wallet();
    assert_eq!(second.load().await.unwrap(), WalletStatus::Locked);

    second.unlock(PASSWORD).await.unwrap();
    assert_eq!(second.status().await, WalletStatus::Unlocked);
}

#[tokio::test]
async fn lock_invalidates_cache_immediately() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    wallet.lock().await.unwrap();
    assert!(!env.session.contains(SESSION_KEY));

    let restarted = env.wallet();
    assert_eq!(restarted.load().await.unwrap(), WalletStatus::Locked);
}

#[tokio::test]
async fn reset_removes_vault_and_cache() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    wallet.reset().await.unwrap();
    assert_eq!(wallet.status().await, WalletStatus::NeedsOnboarding);
    assert!(!env.store.contains(VAULT_KEY));
    assert!(!env.session.contains(SESSION_KEY));

    let restarted = env.wallet();
    assert_eq!(restarted.load().await.unwrap(), WalletStatus::NeedsOnboarding);
}

#[tokio::test]
async fn stale_cache_entry_is_discarded() {
    let env = Env::new();
    env.unlocked().await;
    // A cached key for some other vault.
    let other = Env::new();
    other.unlocked().await;
    let foreign = other.session.get(SESSION_KEY).unwrap().unwrap();
    env.session.set(SESSION_KEY, &foreign).unwrap();

    let restarted = env.wallet();
    assert_eq!(restarted.load().await.unwrap(), WalletStatus::Locked);
    assert!(!env.session.contains(SESSION_KEY));
}

// ---------------------------------------------------------------------------
// 2. Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn password_opens_state_saved_with_cached_key() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    let account = wallet.create_account().await.unwrap();
    wallet.set_node_url("https://node.example:8443").await.unwrap();

    env.clock.advance(Duration::from_secs(3_600));
    let restarted = env.wallet();
    assert_eq!(restarted.load().await.unwrap(), WalletStatus::Locked);
    restarted.unlock(PASSWORD).await.unwrap();

    let state = restarted.state().await.unwrap();
    assert_eq!(state.accounts.len(), 2);
    assert_eq!(state.selected_account_id.as_deref(), Some(account.id.as_str()));
    assert_eq!(state.settings.node_url, "https://node.example:8443");
}

#[tokio::test]
async fn every_save_uses_a_fresh_nonce() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    let read_iv = || {
        let bytes = env.store.get(VAULT_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (json["ivB64"].clone(), json["saltB64"].clone())
    };
    let (iv1, salt1) = read_iv();
    let state = wallet.state().await.unwrap();
    wallet.save(state.clone()).await.unwrap();
    let (iv2, salt2) = read_iv();
    wallet.save(state).await.unwrap();
    let (iv3, _) = read_iv();
    assert_ne!(iv1, iv2);
    assert_ne!(iv2, iv3);
    assert_eq!(salt1, salt2);
}

#[tokio::test]
async fn tampered_vault_fails_authentication() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    wallet.lock().await.unwrap();

    let bytes = env.store.get(VAULT_KEY).unwrap().unwrap();
    let mut json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let ct = json["ctB64"].as_str().unwrap().to_string();
    let flipped = if ct.starts_with('A') { "B" } else { "A" };
    json["ctB64"] = serde_json::Value::String(format!("{flipped}{}", &ct[1..]));
    env.store
        .set(VAULT_KEY, &serde_json::to_vec(&json).unwrap())
        .unwrap();

    let restarted = env.wallet();
    restarted.load().await.unwrap();
    let err = restarted.unlock(PASSWORD).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn unknown_envelope_version_is_format_error() {
    let env = Env::new();
    env.store
        .set(VAULT_KEY, br#"{"v":9,"kdf":"pbkdf2-sha256","iter":1}"#)
        .unwrap();
    let wallet = env.wallet();
    let err = wallet.load().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

// ---------------------------------------------------------------------------
// 3. Single-writer discipline
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_are_all_kept() {
    let env = Env::new();
    let wallet = Arc::new(env.unlocked().await);

    let mut handles = Vec::new();
    for i in 0..16 {
        let wallet = wallet.clone();
        handles.push(tokio::spawn(async move {
            wallet.add_tx(record(&format!("tx-{i}"), "someone")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let state = wallet.state().await.unwrap();
    assert_eq!(state.txs.len(), 16);

    // And the sealed copy agrees.
    let restarted = env.wallet();
    restarted.load().await.unwrap();
    assert_eq!(restarted.state().await.unwrap().txs.len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_add_and_update_both_survive() {
    let env = Env::new();
    let wallet = Arc::new(env.unlocked().await);
    wallet.add_tx(record("base", "someone")).await.unwrap();

    let adder = {
        let wallet = wallet.clone();
        tokio::spawn(async move { wallet.add_tx(record("new", "someone")).await })
    };
    let updater = {
        let wallet = wallet.clone();
        tokio::spawn(async move { wallet.update_tx("base", TxPatch::submitted()).await })
    };
    adder.await.unwrap().unwrap();
    updater.await.unwrap().unwrap();

    let state = wallet.state().await.unwrap();
    assert_eq!(state.txs.len(), 2);
    let base = state.txs.iter().find(|t| t.id == "base").unwrap();
    assert_eq!(base.status, TxStatus::Submitted);
}

// ---------------------------------------------------------------------------
// 4. Transfers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_transfer_signs_records_and_submits() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    let account = wallet.selected_account().await.unwrap().unwrap();
    env.node.set_account(
        &account.address(),
        AccountState {
            balance: 1_000,
            nonce: 4,
        },
    );

    let to = recipient();
    let sent = wallet
        .send_transfer(&to, 250, 1_000, Some("rent"))
        .await
        .unwrap();
    assert_eq!(sent.status, TxStatus::Submitted);
    assert_eq!(sent.nonce, 5);
    assert_eq!(sent.from, account.address());

    let submitted = env.node.submitted();
    assert_eq!(submitted.len(), 1);
    let tx = &submitted[0];
    assert_eq!(tx.draft.nonce, 5);
    assert_eq!(tx.draft.to, to);
    assert_eq!(
        serde_json::to_value(&tx.draft.payload).unwrap(),
        serde_json::json!({ "memo": "rent" })
    );
    let sig: Signature = sent.sig.unwrap();
    assert_eq!(tx.sig, sig);
    assert!(verify_signature(sent.id.as_bytes(), &sig, &account.public_key));

    let history = wallet.transactions().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, sent.id);
    assert_eq!(history[0].status, TxStatus::Submitted);
}

#[tokio::test]
async fn rejected_submission_is_recorded_as_failed() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    let account = wallet.selected_account().await.unwrap().unwrap();
    env.node
        .set_account(&account.address(), AccountState { balance: 0, nonce: 0 });
    env.node.reject_submissions(Some("insufficient balance"));

    let err = wallet
        .send_transfer(&recipient(), 10, 1, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);

    let history = wallet.transactions().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, TxStatus::Failed);
    assert!(history[0]
        .error
        .as_deref()
        .unwrap()
        .contains("insufficient balance"));
    assert_eq!(history[0].nonce, 1);
}

#[tokio::test]
async fn unreachable_node_records_nothing() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    env.node.set_unreachable(true);

    let err = wallet
        .send_transfer(&recipient(), 10, 1, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(wallet.transactions().await.unwrap().is_empty());
}

#[tokio::test]
async fn zero_amount_is_rejected() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    let err = wallet
        .send_transfer(&recipient(), 0, 1, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn history_follows_selected_account() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    let first = wallet.selected_account().await.unwrap().unwrap();
    wallet.add_tx(record("mine", &first.address())).await.unwrap();
    wallet.add_tx(record("other", "stranger")).await.unwrap();
    assert_eq!(wallet.transactions().await.unwrap().len(), 1);

    wallet.create_account().await.unwrap();
    assert!(wallet.transactions().await.unwrap().is_empty());

    wallet.select_account(&first.id).await.unwrap();
    let ids: Vec<_> = wallet
        .transactions()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["mine"]);
}

// ---------------------------------------------------------------------------
// 5. Account refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_stores_account_state() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    let account = wallet.selected_account().await.unwrap().unwrap();
    let state = AccountState {
        balance: 77,
        nonce: 3,
    };
    env.node.set_account(&account.address(), state);

    assert_eq!(
        wallet.refresh_selected_account().await.unwrap(),
        RefreshOutcome::Updated(state)
    );
    assert_eq!(wallet.selected_account_state(), Some(state));

    wallet.create_account().await.unwrap();
    assert_eq!(wallet.selected_account_state(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn superseded_refresh_does_not_overwrite() {
    let env = Env::new();
    let wallet = Arc::new(env.unlocked().await);
    let address = wallet.selected_account().await.unwrap().unwrap().address();
    env.node
        .set_account(&address, AccountState { balance: 1, nonce: 1 });
    env.node.set_account_delay(&address, Duration::from_millis(300));

    let slow = {
        let wallet = wallet.clone();
        tokio::spawn(async move { wallet.refresh_selected_account().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    env.node.set_account_delay(&address, Duration::ZERO);
    env.node
        .set_account(&address, AccountState { balance: 2, nonce: 2 });
    let fresh = wallet.refresh_selected_account().await.unwrap();
    assert_eq!(
        fresh,
        RefreshOutcome::Updated(AccountState { balance: 2, nonce: 2 })
    );

    // The slow answer arrives last but is dropped.
    env.node
        .set_account(&address, AccountState { balance: 3, nonce: 3 });
    assert_eq!(slow.await.unwrap().unwrap(), RefreshOutcome::Superseded);
    assert_eq!(
        wallet.selected_account_state(),
        Some(AccountState { balance: 2, nonce: 2 })
    );
}

#[tokio::test]
async fn refresh_started_before_selection_change_is_superseded() {
    let env = Env::new();
    let wallet = Arc::new(env.unlocked().await);
    let first = wallet.selected_account().await.unwrap().unwrap();
    let second = wallet.create_account().await.unwrap();
    wallet.select_account(&first.id).await.unwrap();

    env.node
        .set_account(&first.address(), AccountState { balance: 1, nonce: 1 });
    env.node
        .set_account(&second.address(), AccountState { balance: 2, nonce: 2 });
    env.node
        .set_account_delay(&first.address(), Duration::from_millis(300));

    let slow = {
        let wallet = wallet.clone();
        tokio::spawn(async move { wallet.refresh_selected_account().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    wallet.select_account(&second.id).await.unwrap();

    assert_eq!(slow.await.unwrap().unwrap(), RefreshOutcome::Superseded);
    assert_eq!(wallet.selected_account_state(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn account_state_always_belongs_to_selected_account() {
    let env = Env::new();
    let wallet = Arc::new(env.unlocked().await);
    let first = wallet.selected_account().await.unwrap().unwrap();
    let second = wallet.create_account().await.unwrap();
    env.node
        .set_account(&first.address(), AccountState { balance: 1, nonce: 1 });
    env.node
        .set_account(&second.address(), AccountState { balance: 2, nonce: 2 });

    for round in 0..50 {
        let target = if round % 2 == 0 { &first } else { &second };
        let refresh = {
            let wallet = wallet.clone();
            tokio::spawn(async move { wallet.refresh_selected_account().await })
        };
        let select = {
            let wallet = wallet.clone();
            let id = target.id.clone();
            tokio::spawn(async move { wallet.select_account(&id).await })
        };
        select.await.unwrap().unwrap();
        refresh.await.unwrap().unwrap();

        let selected = wallet.selected_account().await.unwrap().unwrap();
        let expected = if selected.id == first.id { 1 } else { 2 };
        if let Some(state) = wallet.selected_account_state() {
            assert_eq!(state.balance, expected, "round {round}");
        }
    }
}

#[tokio::test]
async fn save_with_new_selection_clears_account_state() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    let first = wallet.selected_account().await.unwrap().unwrap();
    let second = wallet.create_account().await.unwrap();
    wallet.select_account(&first.id).await.unwrap();
    env.node
        .set_account(&first.address(), AccountState { balance: 7, nonce: 0 });
    wallet.refresh_selected_account().await.unwrap();
    assert!(wallet.selected_account_state().is_some());

    let mut next = wallet.state().await.unwrap();
    next.selected_account_id = Some(second.id.clone());
    wallet.save(next).await.unwrap();
    assert_eq!(wallet.selected_account_state(), None);
}

#[tokio::test]
async fn refresh_is_bounded_by_timeout() {
    let env = Env::with_config(WalletConfig {
        kdf_iterations: 1_000,
        node_timeout_secs: 1,
        ..WalletConfig::default()
    });
    let wallet = env.unlocked().await;
    let address = wallet.selected_account().await.unwrap().unwrap().address();
    env.node
        .set_account(&address, AccountState { balance: 1, nonce: 1 });
    env.node.set_account_delay(&address, Duration::from_secs(5));

    let err = wallet.refresh_selected_account().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(wallet.selected_account_state(), None);
}

#[tokio::test]
async fn refresh_of_unknown_account_clears_state() {
    let env = Env::new();
    let wallet = env.unlocked().await;
    let err = wallet.refresh_selected_account().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(wallet.selected_account_state(), None);
}

// ---------------------------------------------------------------------------
// 6. Production storage backends
// ---------------------------------------------------------------------------

#[tokio::test]
async fn directory_store_survives_restart() {
    use modulr_store::{DirStore, MemoryStore};

    let dir = tempfile::tempdir().unwrap();
    let config = WalletConfig {
        kdf_iterations: 1_000,
        ..WalletConfig::default()
    };
    let clock = Arc::new(NullClock::new(1_700_000_000_000));
    let node = Arc::new(NullNode::new());
    let open = |session: Arc<MemoryStore>| {
        Wallet::new(
            config.clone(),
            Arc::new(DirStore::open(dir.path()).unwrap()),
            session,
            clock.clone(),
            Arc::new(StaticConnector(node.clone())),
        )
    };

    let first = open(Arc::new(MemoryStore::new()));
    first.load().await.unwrap();
    first.create_vault(PASSWORD).await.unwrap();
    let account = first.create_account().await.unwrap();
    drop(first);

    // A new process starts with an empty session store.
    let second = open(Arc::new(MemoryStore::new()));
    assert_eq!(second.load().await.unwrap(), WalletStatus::Locked);
    second.unlock(PASSWORD).await.unwrap();
    let selected = second.selected_account().await.unwrap().unwrap();
    assert_eq!(selected.id, account.id);
    assert_eq!(selected.public_key, account.public_key);
}
