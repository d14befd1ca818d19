//! Ed25519 key generation and secure randomness.

use ed25519_dalek::SigningKey;
use modulr_types::{KeyPair, PublicKey, SecretSeed};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::CryptoError;

/// Fill an `N`-byte array from the operating system CSPRNG.
///
/// The only failure is an unavailable randomness source, which callers must
/// treat as fatal.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut out = [0u8; N];
    OsRng
        .try_fill_bytes(&mut out)
        .map_err(|e| CryptoError::RandomnessUnavailable(e.to_string()))?;
    Ok(out)
}

/// Draw a fresh 32-byte Ed25519 seed.
pub fn random_seed() -> Result<SecretSeed, CryptoError> {
    let mut bytes = random_bytes::<32>()?;
    let seed = SecretSeed::new(bytes);
    bytes.zeroize();
    Ok(seed)
}

/// A random local identifier: 16 bytes, lowercase hex (32 chars).
pub fn random_hex_id() -> Result<String, CryptoError> {
    Ok(hex::encode(random_bytes::<16>()?))
}

/// Generate a new Ed25519 key pair from a secure random seed.
pub fn generate_keypair() -> Result<KeyPair, CryptoError> {
    Ok(keypair_from_seed(&random_seed()?))
}

/// Derive the public key for a seed.
pub fn public_from_seed(seed: &SecretSeed) -> PublicKey {
    let signing_key = SigningKey::from_bytes(seed.as_bytes());
    PublicKey(signing_key.verifying_key().to_bytes())
}

/// Derive a key pair from a 32-byte seed (deterministic).
pub fn keypair_from_seed(seed: &SecretSeed) -> KeyPair {
    KeyPair {
        public: public_from_seed(seed),
        seed: seed.clone(),
    }
}
