//! Hardened hierarchical derivation of Ed25519 seeds.
//!
//! The walk follows BIP32 over secp256k1 (master key `"Bitcoin seed"`,
//! hardened-only children); the 32-byte private key at the end of the path is
//! used verbatim as the Ed25519 seed. This matches the key tree produced by the
//! reference JavaScript wallet, so a mnemonic restores the same accounts in
//! either implementation.

use bip32::{ChildNumber, XPrv};
use modulr_types::SecretSeed;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

use crate::CryptoError;

/// Bit set on every segment index of a hardened derivation step.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// A four-segment, all-hardened derivation path such as `m/44'/7337'/0'/0'`.
///
/// Segments are stored without the hardened bit and are always `< 2^31`.
/// Serialized as a plain list of four integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u32; 4]", into = "[u32; 4]")]
pub struct DerivationPath([u32; 4]);

impl DerivationPath {
    /// Purpose 44, coin type 7337, account 0, change 0.
    pub const DEFAULT: DerivationPath = DerivationPath([44, 7337, 0, 0]);

    pub fn new(segments: [u32; 4]) -> Result<Self, CryptoError> {
        if let Some(bad) = segments.iter().find(|&&s| s >= HARDENED_OFFSET) {
            return Err(CryptoError::InvalidDerivationPath(format!(
                "segment {bad} is out of range (must be < 2^31)"
            )));
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> [u32; 4] {
        self.0
    }

    fn to_bip32(self) -> Result<bip32::DerivationPath, CryptoError> {
        let mut path = bip32::DerivationPath::default();
        for segment in self.0 {
            let child = ChildNumber::new(segment, true)
                .map_err(|e| CryptoError::InvalidDerivationPath(e.to_string()))?;
            path.push(child);
        }
        Ok(path)
    }
}

impl Default for DerivationPath {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<[u32; 4]> for DerivationPath {
    type Error = CryptoError;

    fn try_from(segments: [u32; 4]) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<DerivationPath> for [u32; 4] {
    fn from(path: DerivationPath) -> Self {
        path.0
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for segment in self.0 {
            write!(f, "/{segment}'")?;
        }
        Ok(())
    }
}

/// Parses `m/44'/7337'/0'/0'`. Each segment may carry one hardened marker
/// (`'` or `h`) or none: every step is hardened regardless.
impl FromStr for DerivationPath {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CryptoError::InvalidDerivationPath(s.to_string());
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(invalid());
        }
        let mut segments = [0u32; 4];
        let mut count = 0;
        for part in parts {
            if count == segments.len() {
                return Err(invalid());
            }
            let digits = part
                .strip_suffix('\'')
                .or_else(|| part.strip_suffix('h'))
                .unwrap_or(part);
            segments[count] = digits.parse().map_err(|_| invalid())?;
            count += 1;
        }
        if count != segments.len() {
            return Err(invalid());
        }
        Self::new(segments)
    }
}

/// Walk `path` from a BIP39 master seed and return the leaf private key as an
/// Ed25519 seed.
pub fn derive_hardened_seed(
    master_seed: &[u8],
    path: &DerivationPath,
) -> Result<SecretSeed, CryptoError> {
    if !(16..=64).contains(&master_seed.len()) {
        return Err(CryptoError::InvalidLength {
            what: "master seed",
            expected: 64,
            actual: master_seed.len(),
        });
    }
    let leaf = XPrv::derive_from_path(master_seed, &path.to_bip32()?)
        .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;
    let mut bytes = leaf.private_key().to_bytes();
    let seed = SecretSeed::from_slice(bytes.as_slice()).map_err(CryptoError::from);
    bytes.as_mut_slice().zeroize();
    seed
}
