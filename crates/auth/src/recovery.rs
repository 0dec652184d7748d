//! Signer recovery from 65-byte `r ‖ s ‖ v` signatures.

use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use thiserror::Error;
use tracing::debug;

/// Length of an `r ‖ s ‖ v` signature in bytes.
pub const SIGNATURE_LENGTH: usize = 65;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("signature is not valid hex")]
    InvalidHex,

    #[error("signature must be {SIGNATURE_LENGTH} bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("failed to recover key: {0}")]
    RecoveryFailed(String),
}

/// Rewrite a legacy trailing recovery byte (`00`/`01`) to `1b`/`1c`.
///
/// Every other signature is returned unchanged, so applying this twice is
/// the same as applying it once.
pub fn normalize_signature(signature: &str) -> String {
    let split = signature.len().saturating_sub(2);
    if !signature.is_char_boundary(split) {
        return signature.to_string();
    }
    let (body, tail) = signature.split_at(split);
    match tail {
        "00" => format!("{body}1b"),
        "01" => format!("{body}1c"),
        _ => signature.to_string(),
    }
}

/// Decode a `0x`-optional hex signature into its raw bytes.
pub fn parse_signature(signature: &str) -> Result<[u8; SIGNATURE_LENGTH], RecoveryError> {
    let digits = signature
        .trim()
        .strip_prefix("0x")
        .unwrap_or(signature.trim());
    let bytes = hex::decode(digits).map_err(|_| RecoveryError::InvalidHex)?;
    <[u8; SIGNATURE_LENGTH]>::try_from(bytes.as_slice())
        .map_err(|_| RecoveryError::InvalidLength(bytes.len()))
}

/// Recover the address that produced `signature` over `digest`.
pub fn try_recover(digest: &B256, signature: &str) -> Result<Address, RecoveryError> {
    let bytes = parse_signature(&normalize_signature(signature))?;

    let recovery_id_val = match bytes[64] {
        27 => 0,
        28 => 1,
        v => return Err(RecoveryError::InvalidRecoveryId(v)),
    };
    let recovery_id = RecoveryId::try_from(recovery_id_val)
        .map_err(|e| RecoveryError::InvalidSignature(e.to_string()))?;

    let signature = Signature::from_slice(&bytes[..64])
        .map_err(|e| RecoveryError::InvalidSignature(e.to_string()))?;

    let verifying_key =
        VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
            .map_err(|e| RecoveryError::RecoveryFailed(e.to_string()))?;

    // keccak256 of the uncompressed public key without its 0x04 prefix
    let public_key = verifying_key.to_encoded_point(false);
    let hash = keccak256(&public_key.as_bytes()[1..]);

    Ok(Address::from_slice(&hash[12..]))
}

/// Like [`try_recover`], but any failure simply means "no signer".
pub fn recover(digest: &B256, signature: &str) -> Option<Address> {
    match try_recover(digest, signature) {
        Ok(address) => Some(address),
        Err(e) => {
            debug!(error = %e, "Signature recovery failed");
            None
        }
    }
}
