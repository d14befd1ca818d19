#![no_main]

use libfuzzer_sys::fuzz_target;
use modulr_crypto::stable_serialize;
use modulr_types::Value;

// Canonical serialization of any JSON document is valid JSON, deterministic,
// and a fixed point.
fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let value = Value::from(json);
    let first = stable_serialize(&value).expect("plain trees have no cycles");
    let second = stable_serialize(&value).expect("plain trees have no cycles");
    assert_eq!(first, second);

    let reparsed: serde_json::Value =
        serde_json::from_slice(&first).expect("canonical output is JSON");
    let again = stable_serialize(&Value::from(reparsed)).expect("no cycles");
    assert_eq!(first, again);
});
