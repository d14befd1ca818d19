//! BIP39 mnemonic generation and mnemonic-based seed derivation.
//!
//! Generates a 24-word English mnemonic (256-bit entropy). Recovery turns the
//! normalized phrase plus an optional passphrase into the 64-byte BIP39 seed,
//! then walks a hardened path (see [`crate::hd`]) to the account's Ed25519
//! seed.
//!
//! Phrases are normalized before validation: surrounding whitespace trimmed,
//! lowercased, internal whitespace runs collapsed to single spaces. A phrase
//! pasted with stray capitals or line breaks restores the same account.

use bip39::{Language, Mnemonic};
use modulr_types::{KeyPair, SecretSeed};
use zeroize::{Zeroize, Zeroizing};

use crate::hd::{derive_hardened_seed, DerivationPath};
use crate::keys::{keypair_from_seed, random_bytes};
use crate::CryptoError;

/// Canonical form of a user-entered phrase.
pub fn normalize_mnemonic(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse(phrase: &str) -> Result<Mnemonic, CryptoError> {
    let normalized = Zeroizing::new(normalize_mnemonic(phrase));
    Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))
}

/// Generate a new 24-word BIP39 mnemonic from 256-bit entropy.
pub fn generate_mnemonic() -> Result<String, CryptoError> {
    let mut entropy = random_bytes::<32>()?;
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| CryptoError::DerivationFailed(e.to_string()));
    entropy.zeroize();
    Ok(mnemonic?.to_string())
}

/// Validate a phrase (after normalization) against the English wordlist and
/// checksum.
pub fn validate_mnemonic(phrase: &str) -> bool {
    parse(phrase).is_ok()
}

/// The 64-byte BIP39 seed for a phrase and passphrase (PBKDF2-HMAC-SHA512,
/// 2048 rounds, salt `"mnemonic" + passphrase`).
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, CryptoError> {
    let mnemonic = parse(phrase)?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
}

/// Derive an account's Ed25519 seed from a phrase, passphrase and path.
pub fn seed_from_mnemonic(
    phrase: &str,
    passphrase: &str,
    path: &DerivationPath,
) -> Result<SecretSeed, CryptoError> {
    let master = mnemonic_to_seed(phrase, passphrase)?;
    derive_hardened_seed(master.as_slice(), path)
}

/// Derive an Ed25519 keypair from a phrase, passphrase and path.
pub fn keypair_from_mnemonic(
    phrase: &str,
    passphrase: &str,
    path: &DerivationPath,
) -> Result<KeyPair, CryptoError> {
    Ok(keypair_from_seed(&seed_from_mnemonic(phrase, passphrase, path)?))
}
