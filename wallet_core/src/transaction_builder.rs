//! Transfer building: draft, canonical preimage, id and signature.
//!
//! The preimage is
//!
//! ```text
//! v:from:to:amount:fee:nonce:<canonical payload>
//! ```
//!
//! with numbers in their JavaScript textual form and the payload run through
//! the canonical codec (`{}` when absent). The id is the BLAKE3 hex digest of
//! the preimage, and the signature covers the UTF-8 bytes of that hex id.

use modulr_crypto::{format_js_u64, hash_preimage, sign_detached, stable_stringify, CryptoError};
use modulr_types::{
    Signature, SignedTransaction, TransactionDraft, TxId, Value, TRANSFER_TYPE, TRANSFER_VERSION,
};

/// Preimage field delimiter.
pub const PREIMAGE_DELIMITER: char = ':';

/// What the transfer signature covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureTarget {
    /// The raw preimage bytes.
    Preimage,
    /// The lowercase hex transaction id, as UTF-8.
    TxIdHex,
}

/// The convention this wallet signs with.
pub const SIGNATURE_TARGET: SignatureTarget = SignatureTarget::TxIdHex;

/// Everything produced for one transfer.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltTransfer {
    pub draft: TransactionDraft,
    pub preimage: String,
    pub id: TxId,
    pub signature: Signature,
    pub signed: SignedTransaction,
}

/// Compose the transfer draft. A missing payload becomes the empty map and
/// shared nodes are resolved into a plain tree.
pub fn transfer_draft(
    from: &str,
    to: &str,
    amount: u64,
    fee: u64,
    nonce: u64,
    payload: Option<&Value>,
) -> Result<TransactionDraft, CryptoError> {
    let payload = match payload {
        Some(value) if !value.is_null() => value.detach()?,
        _ => Value::empty_map(),
    };
    Ok(TransactionDraft {
        version: TRANSFER_VERSION,
        kind: TRANSFER_TYPE.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        amount,
        fee,
        nonce,
        payload,
    })
}

/// The canonical preimage of a draft.
pub fn transfer_preimage(draft: &TransactionDraft) -> Result<String, CryptoError> {
    let payload = stable_stringify(&draft.payload)?;
    let fields = [
        draft.version.to_string(),
        draft.from.clone(),
        draft.to.clone(),
        format_js_u64(draft.amount),
        format_js_u64(draft.fee),
        format_js_u64(draft.nonce),
        payload,
    ];
    Ok(fields.join(&PREIMAGE_DELIMITER.to_string()))
}

/// The bytes a transfer signature is made over.
pub fn signing_message(preimage: &str, id: &TxId) -> Vec<u8> {
    match SIGNATURE_TARGET {
        SignatureTarget::Preimage => preimage.as_bytes().to_vec(),
        SignatureTarget::TxIdHex => id.to_hex().into_bytes(),
    }
}

/// Build and sign a transfer. `secret` must be the 32-byte ed25519 seed.
pub fn build_transfer(
    from: &str,
    to: &str,
    amount: u64,
    fee: u64,
    nonce: u64,
    payload: Option<&Value>,
    secret: &[u8],
) -> Result<BuiltTransfer, CryptoError> {
    let draft = transfer_draft(from, to, amount, fee, nonce, payload)?;
    let preimage = transfer_preimage(&draft)?;
    let id = hash_preimage(preimage.as_bytes());
    let signature = sign_detached(&signing_message(&preimage, &id), secret)?;
    let signed = SignedTransaction {
        draft: draft.clone(),
        sig: signature,
    };
    Ok(BuiltTransfer {
        draft,
        preimage,
        id,
        signature,
        signed,
    })
}
