//! Cryptographic primitives for the Modulr wallet.
//!
//! - **Ed25519** for account keys and detached transaction signatures
//! - **BIP39 + hardened BIP32** for recoverable, mnemonic-derived seeds
//! - **BLAKE3** for transaction ids
//! - **Canonical serialization** of payload values for hashing
//! - **PBKDF2-HMAC-SHA256 + AES-256-GCM** primitives for the password vault
//!
//! Everything here is a pure function apart from randomness consumption.

pub mod aead;
pub mod canonical;
pub mod error;
pub mod hash;
pub mod hd;
pub mod kdf;
pub mod keys;
pub mod mnemonic;
pub mod sign;

pub use aead::{open_aes256gcm, seal_aes256gcm, SealedBox, NONCE_LEN, TAG_LEN};
pub use canonical::{format_js_number, format_js_u64, stable_serialize, stable_stringify};
pub use error::CryptoError;
pub use hash::{blake3_256, blake3_256_multi, hash_preimage, TX_HASH_ALGORITHM};
pub use hd::{derive_hardened_seed, DerivationPath, HARDENED_OFFSET};
pub use kdf::{derive_key_pbkdf2_sha256, SymmetricKey, DEFAULT_PBKDF2_ITERATIONS, KEY_LEN};
pub use keys::{
    generate_keypair, keypair_from_seed, public_from_seed, random_bytes, random_hex_id,
    random_seed,
};
pub use mnemonic::{
    generate_mnemonic, keypair_from_mnemonic, mnemonic_to_seed, normalize_mnemonic,
    seed_from_mnemonic, validate_mnemonic,
};
pub use sign::{sign_detached, sign_message, verify_signature};
