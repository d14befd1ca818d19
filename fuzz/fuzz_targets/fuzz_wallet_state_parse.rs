#![no_main]

use libfuzzer_sys::fuzz_target;
use modulr_wallet_core::WalletState;

// Decrypted state parsing must reject garbage without panicking, and any
// accepted state must serialize back to something that parses identically.
fuzz_target!(|data: &[u8]| {
    if let Ok(state) = WalletState::from_json(data) {
        let bytes = state.to_json().expect("parsed state serializes");
        let again = WalletState::from_json(&bytes).expect("serialized state parses");
        assert_eq!(state, again);
    }
});
