//! Password-based key derivation (PBKDF2-HMAC-SHA256).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::Hmac;
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::CryptoError;

/// Iteration count for newly sealed vaults.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 310_000;

/// Length of a derived symmetric key (AES-256).
pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CryptoError::InvalidLength {
            what: "symmetric key",
            expected: KEY_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    pub fn from_base64(s: &str) -> Result<Self, CryptoError> {
        let mut bytes = BASE64
            .decode(s.trim())
            .map_err(|e| CryptoError::Serialization(format!("invalid key base64: {e}")))?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// Stretch a password into an AES-256 key.
///
/// `iterations` comes from the stored envelope when opening, so older vaults
/// stay readable after the default is raised. Zero iterations is rejected.
pub fn derive_key_pbkdf2_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<SymmetricKey, CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::Kdf("iteration count must be positive".into()));
    }
    let mut out = [0u8; KEY_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut out)
        .map_err(|e| CryptoError::Kdf(e.to_string()))?;
    let key = SymmetricKey(out);
    out.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc7914_pbkdf2_sha256_vector() {
        // RFC 7914 section 11: P="passwd", S="salt", c=1, first 32 bytes.
        let key = derive_key_pbkdf2_sha256(b"passwd", b"salt", 1).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn deterministic_and_salt_sensitive() {
        let a = derive_key_pbkdf2_sha256(b"pw", b"salt-one", 10).unwrap();
        let b = derive_key_pbkdf2_sha256(b"pw", b"salt-one", 10).unwrap();
        let c = derive_key_pbkdf2_sha256(b"pw", b"salt-two", 10).unwrap();
        let d = derive_key_pbkdf2_sha256(b"pw", b"salt-one", 11).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn zero_iterations_rejected() {
        assert!(matches!(
            derive_key_pbkdf2_sha256(b"pw", b"salt", 0),
            Err(CryptoError::Kdf(_))
        ));
    }

    #[test]
    fn base64_roundtrip_and_length_check() {
        let key = SymmetricKey::new([9u8; KEY_LEN]);
        assert_eq!(SymmetricKey::from_base64(&key.to_base64()).unwrap(), key);
        assert!(SymmetricKey::from_slice(&[0u8; 16]).is_err());
        assert!(SymmetricKey::from_base64("not base64!").is_err());
    }

    #[test]
    fn debug_is_redacted() {
        let key = SymmetricKey::new([1u8; KEY_LEN]);
        assert!(!format!("{key:?}").contains('1'));
    }
}
