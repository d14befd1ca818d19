//! BLAKE3 hashing for transaction ids.

use modulr_types::TxId;

/// The hash function bound to transaction ids. Independent verifiers must
/// use the same one; changing it is a protocol version bump.
pub const TX_HASH_ALGORITHM: &str = "blake3";

/// Compute a 256-bit BLAKE3 hash of arbitrary data.
pub fn blake3_256(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake3_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Hash a canonical transaction preimage to produce its [`TxId`].
pub fn hash_preimage(preimage: &[u8]) -> TxId {
    TxId::new(blake3_256(preimage))
}
