//! Local signing wallet.
//!
//! Produces the order and command signatures the relay verifies. Used by
//! client tooling, tests and benchmarks; the relay itself never holds keys.

use alloy_primitives::{Address, B256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use std::str::FromStr;

/// A wallet holding a private key.
#[derive(Clone)]
pub struct RelayWallet {
    signer: PrivateKeySigner,
    address: Address,
}

impl RelayWallet {
    /// Create a wallet from a hex-encoded private key, optionally prefixed
    /// with "0x".
    pub fn from_private_key(key: &str) -> Result<Self> {
        let key_clean = key.trim().trim_start_matches("0x");

        let signer = PrivateKeySigner::from_str(key_clean)
            .context("Invalid private key format - expected 64 hex characters")?;

        let address = signer.address();

        Ok(Self { signer, address })
    }

    /// Create a wallet with a freshly generated key.
    pub fn random() -> Self {
        let signer = PrivateKeySigner::random();
        let address = signer.address();
        Self { signer, address }
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte digest (e.g. a typed-data hash) without any prefix.
    pub async fn sign_hash(&self, digest: &B256) -> Result<Vec<u8>> {
        let signature = self.signer.sign_hash(digest).await?;
        Ok(signature.as_bytes().to_vec())
    }

    /// [`Self::sign_hash`] rendered as `0x` hex.
    pub async fn sign_hash_hex(&self, digest: &B256) -> Result<String> {
        Ok(format!("0x{}", hex::encode(self.sign_hash(digest).await?)))
    }

    /// Sign a message with the personal-message prefix
    /// ("\x19Ethereum Signed Message:\n{len}").
    pub async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signature = self.signer.sign_message(message).await?;
        Ok(signature.as_bytes().to_vec())
    }

    /// [`Self::sign_message`] rendered as `0x` hex.
    pub async fn sign_message_hex(&self, message: &[u8]) -> Result<String> {
        Ok(format!("0x{}", hex::encode(self.sign_message(message).await?)))
    }
}

impl std::fmt::Debug for RelayWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the private key in debug output
        f.debug_struct("RelayWallet")
            .field("address", &format!("{}", self.address))
            .finish()
    }
}
