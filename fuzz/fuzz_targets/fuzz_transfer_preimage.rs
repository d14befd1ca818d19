#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use modulr_crypto::{keypair_from_seed, verify_signature};
use modulr_types::{SecretSeed, Value};
use modulr_wallet_core::build_transfer;

#[derive(Debug, Arbitrary)]
struct Input {
    seed: [u8; 32],
    from: String,
    to: String,
    amount: u64,
    fee: u64,
    nonce: u64,
    memo: Option<String>,
}

// Building is deterministic and the signature always verifies.
fuzz_target!(|input: Input| {
    let payload = input.memo.as_deref().map(|m| Value::map([("memo", m)]));
    let build = || {
        build_transfer(
            &input.from,
            &input.to,
            input.amount,
            input.fee,
            input.nonce,
            payload.as_ref(),
            &input.seed,
        )
        .expect("32-byte seed always signs")
    };
    let a = build();
    let b = build();
    assert_eq!(a.preimage, b.preimage);
    assert_eq!(a.id, b.id);

    let public = keypair_from_seed(&SecretSeed::new(input.seed)).public;
    assert!(verify_signature(a.id.to_hex().as_bytes(), &a.signature, &public));
});
