use proptest::prelude::*;

use modulr_types::{PublicKey, SecretSeed, Signature, Timestamp, TxId, Value};

proptest! {
    /// PublicKey base58 text form parses back to the same key.
    #[test]
    fn public_key_base58_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let key = PublicKey(bytes);
        prop_assert_eq!(PublicKey::from_base58(&key.to_base58()).unwrap(), key);
    }

    /// TxId hex text form parses back to the same id.
    #[test]
    fn tx_id_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let id = TxId::new(bytes);
        prop_assert_eq!(TxId::from_hex(&id.to_hex()).unwrap(), id);
    }

    /// SecretSeed accepts exactly 32 bytes and nothing else.
    #[test]
    fn seed_length_is_enforced(bytes in prop::collection::vec(0u8.., 0..80)) {
        prop_assert_eq!(SecretSeed::from_slice(&bytes).is_ok(), bytes.len() == 32);
    }

    /// Signature base64 text form parses back to the same signature.
    #[test]
    fn signature_base64_roundtrip(hi in prop::array::uniform32(0u8..), lo in prop::array::uniform32(0u8..)) {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&hi);
        bytes[32..].copy_from_slice(&lo);
        let sig = Signature(bytes);
        prop_assert_eq!(Signature::from_base64(&sig.to_base64()).unwrap(), sig);
    }

    /// Timestamp ordering: from_millis(a) <= from_millis(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta.is_before(tb), a < b);
    }

    /// Maps built from the same entries in any order are equal.
    #[test]
    fn value_map_order_independent(entries in prop::collection::btree_map("[a-z]{1,6}", 0u64..1000, 0..8)) {
        let forward = Value::map(entries.clone());
        let reversed = Value::map(entries.into_iter().rev());
        prop_assert_eq!(forward, reversed);
    }
}
