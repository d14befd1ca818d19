#![no_main]

use libfuzzer_sys::fuzz_target;
use modulr_crypto::SymmetricKey;
use modulr_wallet_core::{Vault, VaultEnvelope, VaultError};

// Parse arbitrary bytes as a stored vault envelope and try to open it.
fuzz_target!(|data: &[u8]| {
    let Ok(envelope) = VaultEnvelope::from_slice(data) else {
        return;
    };
    // Cap the work factor; the stored count is attacker-controlled here.
    if envelope.iter > 16 {
        return;
    }
    let vault = Vault::new(1);
    match vault.open("password", &envelope) {
        // Only a matching tag gets this far, which random input cannot forge.
        Ok(_) => {}
        Err(VaultError::AuthenticationFailed)
        | Err(VaultError::Malformed(_))
        | Err(VaultError::UnsupportedFormat { .. }) => {}
        Err(VaultError::Crypto(e)) => panic!("unexpected crypto failure: {e}"),
    }
    let _ = vault.open_with_raw_key(&SymmetricKey::new([0u8; 32]), &envelope);
});
