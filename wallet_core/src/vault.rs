//! Password-protected vault envelope.
//!
//! Encrypts an opaque plaintext (the serialized wallet state) under a
//! password:
//! 1. PBKDF2-HMAC-SHA256 derives a 32-byte key from the password + random salt
//! 2. AES-256-GCM encrypts the plaintext with a random nonce
//! 3. The result is stored as a JSON envelope carrying every parameter needed
//!    to open it again
//!
//! The derived key can be taken out of the envelope ([`Vault::derive_raw_key`])
//! and reused for later opens and reseals, so a session does not keep the
//! password around. Every seal draws a fresh nonce whatever the key source.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use modulr_crypto::{
    derive_key_pbkdf2_sha256, open_aes256gcm, random_bytes, seal_aes256gcm, SymmetricKey,
    DEFAULT_PBKDF2_ITERATIONS,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::VaultError;

/// Envelope format version.
pub const VAULT_VERSION: u32 = 1;

/// KDF identifier stored in the envelope.
pub const KDF_PBKDF2_SHA256: &str = "pbkdf2-sha256";

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Highest iteration count accepted from an envelope or used for sealing.
pub const MAX_ITERATIONS: u32 = 10 * DEFAULT_PBKDF2_ITERATIONS;

/// The persisted envelope. Field names are part of the storage format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEnvelope {
    pub v: u32,
    pub kdf: String,
    pub iter: u32,
    #[serde(rename = "saltB64")]
    pub salt_b64: String,
    #[serde(rename = "ivB64")]
    pub iv_b64: String,
    #[serde(rename = "ctB64")]
    pub ct_b64: String,
}

/// Just enough of an envelope to decide whether the rest is readable.
#[derive(Deserialize)]
struct EnvelopeHeader {
    #[serde(default)]
    v: Option<u32>,
    #[serde(default)]
    kdf: Option<String>,
}

impl VaultEnvelope {
    /// Parse stored bytes. A version or KDF this code does not know is
    /// [`VaultError::UnsupportedFormat`] even when the remaining fields differ.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VaultError> {
        let header: EnvelopeHeader =
            serde_json::from_slice(bytes).map_err(|e| VaultError::Malformed(e.to_string()))?;
        let version = header.v.unwrap_or(0);
        let kdf = header.kdf.unwrap_or_default();
        if version != VAULT_VERSION || kdf != KDF_PBKDF2_SHA256 {
            return Err(VaultError::UnsupportedFormat { version, kdf });
        }
        let envelope: Self =
            serde_json::from_slice(bytes).map_err(|e| VaultError::Malformed(e.to_string()))?;
        envelope.check_format()?;
        Ok(envelope)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, VaultError> {
        serde_json::to_vec(self).map_err(|e| VaultError::Malformed(e.to_string()))
    }

    fn check_format(&self) -> Result<(), VaultError> {
        if self.v != VAULT_VERSION || self.kdf != KDF_PBKDF2_SHA256 {
            return Err(VaultError::UnsupportedFormat {
                version: self.v,
                kdf: self.kdf.clone(),
            });
        }
        check_iterations(self.iter)
    }

    fn salt(&self) -> Result<Vec<u8>, VaultError> {
        decode_field("saltB64", &self.salt_b64)
    }

    fn nonce(&self) -> Result<Vec<u8>, VaultError> {
        decode_field("ivB64", &self.iv_b64)
    }

    fn ciphertext(&self) -> Result<Vec<u8>, VaultError> {
        decode_field("ctB64", &self.ct_b64)
    }
}

fn check_iterations(iter: u32) -> Result<(), VaultError> {
    if iter == 0 {
        return Err(VaultError::Malformed("iteration count is zero".into()));
    }
    if iter > MAX_ITERATIONS {
        return Err(VaultError::Malformed(format!(
            "iteration count {iter} exceeds {MAX_ITERATIONS}"
        )));
    }
    Ok(())
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, VaultError> {
    BASE64
        .decode(value)
        .map_err(|e| VaultError::Malformed(format!("invalid {name}: {e}")))
}

/// Seals and opens envelopes. Holds the iteration count used for new seals;
/// opening always uses the count stored in the envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vault {
    iterations: u32,
}

impl Default for Vault {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

impl Vault {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Encrypt `plaintext` under `password` with a fresh salt and nonce.
    pub fn seal(&self, password: &str, plaintext: &[u8]) -> Result<VaultEnvelope, VaultError> {
        self.create(password, plaintext).map(|(envelope, _)| envelope)
    }

    /// Like [`Vault::seal`], also returning the derived key so the caller can
    /// cache it without a second derivation.
    pub fn create(
        &self,
        password: &str,
        plaintext: &[u8],
    ) -> Result<(VaultEnvelope, SymmetricKey), VaultError> {
        check_iterations(self.iterations)?;
        let salt = random_bytes::<SALT_LEN>()?;
        let key = derive_key_pbkdf2_sha256(password.as_bytes(), &salt, self.iterations)?;
        let sealed = seal_aes256gcm(&key, plaintext)?;
        tracing::debug!(iterations = self.iterations, "vault sealed");
        let envelope = VaultEnvelope {
            v: VAULT_VERSION,
            kdf: KDF_PBKDF2_SHA256.to_string(),
            iter: self.iterations,
            salt_b64: BASE64.encode(salt),
            iv_b64: BASE64.encode(sealed.nonce),
            ct_b64: BASE64.encode(&sealed.ciphertext),
        };
        Ok((envelope, key))
    }

    /// Decrypt with a password. Wrong password and modified ciphertext both
    /// surface as [`VaultError::AuthenticationFailed`].
    pub fn open(
        &self,
        password: &str,
        envelope: &VaultEnvelope,
    ) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        let key = self.derive_raw_key(password, envelope)?;
        self.open_with_raw_key(&key, envelope)
    }

    /// The key [`Vault::open`] would use, without decrypting anything.
    pub fn derive_raw_key(
        &self,
        password: &str,
        envelope: &VaultEnvelope,
    ) -> Result<SymmetricKey, VaultError> {
        envelope.check_format()?;
        let salt = envelope.salt()?;
        Ok(derive_key_pbkdf2_sha256(
            password.as_bytes(),
            &salt,
            envelope.iter,
        )?)
    }

    pub fn open_with_raw_key(
        &self,
        key: &SymmetricKey,
        envelope: &VaultEnvelope,
    ) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        envelope.check_format()?;
        let nonce = envelope.nonce()?;
        let ciphertext = envelope.ciphertext()?;
        let plaintext = open_aes256gcm(key, &nonce, &ciphertext)?;
        tracing::debug!("vault opened");
        Ok(Zeroizing::new(plaintext))
    }

    /// Reseal under an already derived key. Salt and iteration count are
    /// carried over from `previous` so the password still derives `key`; the
    /// nonce is always new.
    pub fn seal_with_raw_key(
        &self,
        key: &SymmetricKey,
        previous: &VaultEnvelope,
        plaintext: &[u8],
    ) -> Result<VaultEnvelope, VaultError> {
        previous.check_format()?;
        let sealed = seal_aes256gcm(key, plaintext)?;
        Ok(VaultEnvelope {
            v: VAULT_VERSION,
            kdf: KDF_PBKDF2_SHA256.to_string(),
            iter: previous.iter,
            salt_b64: previous.salt_b64.clone(),
            iv_b64: BASE64.encode(sealed.nonce),
            ct_b64: BASE64.encode(&sealed.ciphertext),
        })
    }
}
