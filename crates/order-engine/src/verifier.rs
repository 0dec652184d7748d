//! Signature verification: recovery, delegation and the contract-wallet
//! fallback.

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use tracing::{debug, warn};

use crate::delegation::DelegationResolver;
use crate::error::{OrderError, Result};
use crate::ports::ChainReader;

#[derive(Clone)]
pub struct SignatureVerifier {
    resolver: DelegationResolver,
    chain: Option<Arc<dyn ChainReader>>,
}

impl SignatureVerifier {
    pub fn new(resolver: DelegationResolver, chain: Option<Arc<dyn ChainReader>>) -> Self {
        Self { resolver, chain }
    }

    pub fn resolver(&self) -> &DelegationResolver {
        &self.resolver
    }

    /// Check that `signature` over `digest` authorizes acting for `party`.
    ///
    /// With `claimed_signer` set, the signature must recover to that key and
    /// the key must be `party` or a registered delegate of it.
    pub async fn verify(
        &self,
        digest: &B256,
        signature: &str,
        party: &Address,
        claimed_signer: Option<&Address>,
    ) -> Result<()> {
        let recovered = auth::recover(digest, signature);

        if let Some(recovered) = recovered {
            let signer_matches = claimed_signer.map_or(true, |s| *s == recovered);
            if signer_matches && self.resolver.resolve(&recovered, party).await? {
                return Ok(());
            }
            debug!(
                recovered = %recovered,
                party = %party,
                claimed_signer = ?claimed_signer,
                "Recovered signer is not authorized"
            );
        }

        if self.contract_wallet_accepts(digest, signature, party).await {
            return Ok(());
        }

        match recovered {
            Some(_) => Err(OrderError::SignerMismatch),
            None => Err(OrderError::BadSignature),
        }
    }

    /// EIP-1271 check against `party`. Chain errors count as rejection.
    async fn contract_wallet_accepts(
        &self,
        digest: &B256,
        signature: &str,
        party: &Address,
    ) -> bool {
        let Some(chain) = &self.chain else {
            return false;
        };
        let digits = signature.trim().trim_start_matches("0x");
        let Ok(bytes) = hex::decode(digits) else {
            return false;
        };
        match chain.is_valid_signature(party, digest, &bytes).await {
            Ok(valid) => valid,
            Err(e) => {
                warn!(party = %party, error = %e, "Contract wallet signature check failed");
                false
            }
        }
    }
}
