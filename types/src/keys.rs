//! Cryptographic key types for account identity and signing.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::TypesError;

/// A 32-byte Ed25519 public key.
///
/// The textual form (wire format, account `pub` field) is base58 with the
/// Bitcoin alphabet.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Parse a base58 public key. Rejects anything that does not decode to
    /// exactly 32 bytes.
    pub fn from_base58(s: &str) -> Result<Self, TypesError> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| TypesError::InvalidPublicKey(e.to_string()))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            TypesError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base58())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base58(&s).map_err(serde::de::Error::custom)
    }
}

/// A 32-byte Ed25519 seed: the account's secret material.
///
/// Zeroized on drop and redacted in `Debug`. Serializes as standard base64
/// (the `seedB64` field of a persisted account), which only ever happens
/// inside the sealed vault plaintext.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct SecretSeed([u8; 32]);

impl SecretSeed {
    pub const LEN: usize = 32;

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build a seed from arbitrary secret material, which must be exactly
    /// 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TypesError::InvalidSeedLength(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn from_base64(s: &str) -> Result<Self, TypesError> {
        let mut bytes = STANDARD
            .decode(s)
            .map_err(|e| TypesError::InvalidEncoding(e.to_string()))?;
        let seed = Self::from_slice(&bytes);
        bytes.zeroize();
        seed
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SecretSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretSeed(<redacted>)")
    }
}

impl Serialize for SecretSeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for SecretSeed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

/// A 64-byte detached Ed25519 signature, base64 on the wire.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn from_base64(s: &str) -> Result<Self, TypesError> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|e| TypesError::InvalidSignature(e.to_string()))?;
        let arr: [u8; 64] = bytes.as_slice().try_into().map_err(|_| {
            TypesError::InvalidSignature(format!("expected 64 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.0[..8]))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

/// An Ed25519 key pair (public key + seed).
///
/// Use `modulr_crypto::keypair_from_seed()` to construct key pairs so the
/// public key is always the one derived from the seed.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public: PublicKey,
    pub seed: SecretSeed,
}
