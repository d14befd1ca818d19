//! Wallet accounts: key material plus how it was obtained.
//!
//! An account is either *random* (a bare 32-byte seed, the legacy kind) or
//! *derived* (seed recoverable from a BIP39 phrase, passphrase and hardened
//! path). New default accounts are always derived from a fresh 24-word phrase.
//!
//! The public key is never trusted from storage: loading a record re-derives
//! it from the seed and rejects the record on mismatch.

use modulr_crypto::{
    generate_mnemonic, normalize_mnemonic, public_from_seed, random_hex_id, random_seed,
    seed_from_mnemonic, DerivationPath,
};
use modulr_types::{PublicKey, SecretSeed};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WalletError;

/// How an account's seed came to be.
#[derive(Clone, PartialEq)]
pub enum AccountKind {
    Random {
        seed: SecretSeed,
    },
    Derived {
        seed: SecretSeed,
        mnemonic: String,
        passphrase: String,
        path: DerivationPath,
    },
}

impl AccountKind {
    pub fn seed(&self) -> &SecretSeed {
        match self {
            AccountKind::Random { seed } | AccountKind::Derived { seed, .. } => seed,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, AccountKind::Derived { .. })
    }
}

impl fmt::Debug for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKind::Random { .. } => f.write_str("Random"),
            AccountKind::Derived { path, .. } => write!(f, "Derived({path})"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AccountRecord", into = "AccountRecord")]
pub struct Account {
    /// Local identifier: 16 random bytes as lowercase hex.
    pub id: String,
    pub name: String,
    pub public_key: PublicKey,
    pub kind: AccountKind,
}

impl Account {
    /// Build an account from a seed, deriving the public key.
    pub fn from_parts(id: String, name: String, kind: AccountKind) -> Self {
        let public_key = public_from_seed(kind.seed());
        Self {
            id,
            name,
            public_key,
            kind,
        }
    }

    /// A new account around a fresh random seed.
    pub fn generate_random(name: impl Into<String>) -> Result<Self, WalletError> {
        let seed = random_seed()?;
        Ok(Self::from_parts(
            random_hex_id()?,
            name.into(),
            AccountKind::Random { seed },
        ))
    }

    /// An account recovered from a phrase. The phrase is normalized before
    /// validation and stored normalized.
    pub fn generate_from_mnemonic(
        name: impl Into<String>,
        mnemonic: &str,
        passphrase: &str,
        path: DerivationPath,
    ) -> Result<Self, WalletError> {
        let mnemonic = normalize_mnemonic(mnemonic);
        let seed = seed_from_mnemonic(&mnemonic, passphrase, &path)?;
        Ok(Self::from_parts(
            random_hex_id()?,
            name.into(),
            AccountKind::Derived {
                seed,
                mnemonic,
                passphrase: passphrase.to_string(),
                path,
            },
        ))
    }

    /// A new recoverable account: fresh 24-word phrase, empty passphrase,
    /// default path.
    pub fn generate_new_default(name: impl Into<String>) -> Result<Self, WalletError> {
        let mnemonic = generate_mnemonic()?;
        Self::generate_from_mnemonic(name, &mnemonic, "", DerivationPath::DEFAULT)
    }

    pub fn seed(&self) -> &SecretSeed {
        self.kind.seed()
    }

    /// Base58 public key, the account's on-chain address.
    pub fn address(&self) -> String {
        self.public_key.to_base58()
    }
}

/// Persisted JSON shape of an account.
#[derive(Serialize, Deserialize)]
struct AccountRecord {
    id: String,
    name: String,
    #[serde(rename = "pub")]
    public_key: String,
    #[serde(rename = "seedB64")]
    seed: SecretSeed,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mnemonic: Option<String>,
    #[serde(
        rename = "mnemonicPassword",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    mnemonic_password: Option<String>,
    #[serde(rename = "bip44Path", default, skip_serializing_if = "Option::is_none")]
    path: Option<DerivationPath>,
}

impl TryFrom<AccountRecord> for Account {
    type Error = WalletError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let stored = PublicKey::from_base58(&record.public_key)
            .map_err(|e| WalletError::InvalidAccount(format!("{}: {e}", record.id)))?;
        let kind = match record.mnemonic {
            Some(mnemonic) => AccountKind::Derived {
                seed: record.seed,
                mnemonic,
                passphrase: record.mnemonic_password.unwrap_or_default(),
                path: record.path.unwrap_or_default(),
            },
            None => AccountKind::Random { seed: record.seed },
        };
        let account = Account::from_parts(record.id, record.name, kind);
        if account.public_key != stored {
            return Err(WalletError::InvalidAccount(format!(
                "{}: public key does not match seed",
                account.id
            )));
        }
        Ok(account)
    }
}

impl From<Account> for AccountRecord {
    fn from(account: Account) -> Self {
        let public_key = account.public_key.to_base58();
        match account.kind {
            AccountKind::Random { seed } => AccountRecord {
                id: account.id,
                name: account.name,
                public_key,
                seed,
                mnemonic: None,
                mnemonic_password: None,
                path: None,
            },
            AccountKind::Derived {
                seed,
                mnemonic,
                passphrase,
                path,
            } => AccountRecord {
                id: account.id,
                name: account.name,
                public_key,
                seed,
                mnemonic: Some(mnemonic),
                mnemonic_password: Some(passphrase),
                path: Some(path),
            },
        }
    }
}
