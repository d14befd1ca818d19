//! AES-256-GCM sealing with a fresh random nonce per call.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::kdf::SymmetricKey;
use crate::keys::random_bytes;
use crate::CryptoError;

/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length, appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Output of [`seal_aes256gcm`]. `ciphertext` carries the tag at its end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedBox {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

fn cipher(key: &SymmetricKey) -> Result<Aes256Gcm, CryptoError> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|e| CryptoError::Encryption(e.to_string()))
}

/// Encrypt `plaintext`. A nonce is drawn from the OS CSPRNG on every call and
/// never supplied by the caller.
pub fn seal_aes256gcm(key: &SymmetricKey, plaintext: &[u8]) -> Result<SealedBox, CryptoError> {
    let nonce = random_bytes::<NONCE_LEN>()?;
    let ciphertext = cipher(key)?
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    Ok(SealedBox { nonce, ciphertext })
}

/// Decrypt and authenticate. Any tag mismatch, whether from a wrong key or a
/// modified ciphertext, is [`CryptoError::AuthenticationFailed`].
pub fn open_aes256gcm(
    key: &SymmetricKey,
    nonce: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::InvalidLength {
            what: "nonce",
            expected: NONCE_LEN,
            actual: nonce.len(),
        });
    }
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoError::AuthenticationFailed);
    }
    cipher(key)?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> SymmetricKey {
        SymmetricKey::new([byte; 32])
    }

    #[test]
    fn seal_open_roundtrip() {
        let sealed = seal_aes256gcm(&key(1), b"wallet state").unwrap();
        assert_eq!(sealed.ciphertext.len(), b"wallet state".len() + TAG_LEN);
        let opened = open_aes256gcm(&key(1), &sealed.nonce, &sealed.ciphertext).unwrap();
        assert_eq!(opened, b"wallet state");
    }

    #[test]
    fn nonces_never_repeat() {
        let a = seal_aes256gcm(&key(1), b"same").unwrap();
        let b = seal_aes256gcm(&key(1), b"same").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = seal_aes256gcm(&key(1), b"secret").unwrap();
        assert!(matches!(
            open_aes256gcm(&key(2), &sealed.nonce, &sealed.ciphertext),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let mut sealed = seal_aes256gcm(&key(1), b"secret").unwrap();
        sealed.ciphertext[0] ^= 0x01;
        assert!(matches!(
            open_aes256gcm(&key(1), &sealed.nonce, &sealed.ciphertext),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn truncated_input_fails() {
        assert!(matches!(
            open_aes256gcm(&key(1), &[0u8; NONCE_LEN], &[0u8; 4]),
            Err(CryptoError::AuthenticationFailed)
        ));
        assert!(matches!(
            open_aes256gcm(&key(1), &[0u8; 8], &[0u8; 32]),
            Err(CryptoError::InvalidLength { what: "nonce", .. })
        ));
    }
}
