//! Ed25519 detached signing and verification.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use modulr_types::{PublicKey, SecretSeed, Signature};

use crate::CryptoError;

/// Sign a message with a seed, returning the detached signature.
pub fn sign_message(message: &[u8], seed: &SecretSeed) -> Signature {
    let signing_key = SigningKey::from_bytes(seed.as_bytes());
    Signature(signing_key.sign(message).to_bytes())
}

/// Sign with raw secret material, which must be exactly 32 bytes.
pub fn sign_detached(message: &[u8], secret: &[u8]) -> Result<Signature, CryptoError> {
    let seed = SecretSeed::from_slice(secret)?;
    Ok(sign_message(message, &seed))
}

/// Verify a signature against a message and public key.
///
/// Returns `true` if the signature is valid, `false` otherwise.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify(message, &dalek_sig).is_ok()
}
