//! Delegate signer resolution.
//!
//! A signer key may act for an owner once it has signed
//! `addvaultsigner:<owner>`. Registrations are keyed by the signer.

use std::sync::Arc;

use alloy_primitives::Address;
use relay_core::signing::{add_signer_message, hash_plain_message};
use tracing::{debug, info};

use crate::error::{OrderError, Result};
use crate::ports::OrderStore;

#[derive(Clone)]
pub struct DelegationResolver {
    store: Arc<dyn OrderStore>,
}

impl DelegationResolver {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Whether `recovered` may act for `claimed`: either it is `claimed`, or
    /// it is a registered delegate of `claimed`.
    pub async fn resolve(&self, recovered: &Address, claimed: &Address) -> Result<bool> {
        if recovered == claimed {
            return Ok(true);
        }
        let owner = self.store.lookup_delegation(recovered).await?;
        debug!(
            signer = %recovered,
            claimed = %claimed,
            owner = ?owner,
            "Resolved delegation"
        );
        Ok(owner.as_ref() == Some(claimed))
    }

    /// Register `signer` as a delegate of `owner`. The signature must be the
    /// signer's own over `addvaultsigner:<lowercase owner>`.
    pub async fn register_delegate(
        &self,
        owner: &Address,
        signer: &Address,
        signature: &str,
    ) -> Result<()> {
        let digest = hash_plain_message(&add_signer_message(owner));
        match auth::recover(&digest, signature) {
            Some(recovered) if recovered == *signer => {}
            _ => return Err(OrderError::BadSignature),
        }

        self.store.register_delegation(signer, owner).await?;
        info!(owner = %owner, signer = %signer, "Delegate signer registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryOrderStore;
    use crate::ports::MockOrderStore;
    use auth::RelayWallet;

    #[tokio::test]
    async fn test_direct_match_needs_no_lookup() {
        let mut store = MockOrderStore::new();
        store.expect_lookup_delegation().never();
        let resolver = DelegationResolver::new(Arc::new(store));

        let user = Address::repeat_byte(1);
        assert!(resolver.resolve(&user, &user).await.unwrap());
    }

    #[tokio::test]
    async fn test_registered_delegate_resolves_only_for_its_owner() {
        let store = Arc::new(MemoryOrderStore::new());
        let resolver = DelegationResolver::new(store.clone());

        let owner = Address::repeat_byte(1);
        let delegate = RelayWallet::random();
        let message = add_signer_message(&owner);
        let signature = delegate
            .sign_message_hex(message.as_bytes())
            .await
            .unwrap();

        resolver
            .register_delegate(&owner, &delegate.address(), &signature)
            .await
            .unwrap();

        assert!(resolver.resolve(&delegate.address(), &owner).await.unwrap());
        assert!(!resolver
            .resolve(&delegate.address(), &Address::repeat_byte(2))
            .await
            .unwrap());
        // Delegation is one-way.
        assert!(!resolver.resolve(&owner, &delegate.address()).await.unwrap());
    }

    #[tokio::test]
    async fn test_registration_must_be_signed_by_the_signer() {
        let store = Arc::new(MemoryOrderStore::new());
        let resolver = DelegationResolver::new(store.clone());

        let owner = Address::repeat_byte(1);
        let delegate = RelayWallet::random();
        let impostor = RelayWallet::random();
        let signature = impostor
            .sign_message_hex(add_signer_message(&owner).as_bytes())
            .await
            .unwrap();

        let err = resolver
            .register_delegate(&owner, &delegate.address(), &signature)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::BadSignature));
        assert_eq!(
            store.lookup_delegation(&delegate.address()).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_reregistration_overwrites() {
        let store = Arc::new(MemoryOrderStore::new());
        let resolver = DelegationResolver::new(store.clone());
        let delegate = RelayWallet::random();

        for owner in [Address::repeat_byte(1), Address::repeat_byte(2)] {
            let signature = delegate
                .sign_message_hex(add_signer_message(&owner).as_bytes())
                .await
                .unwrap();
            resolver
                .register_delegate(&owner, &delegate.address(), &signature)
                .await
                .unwrap();
        }

        assert!(!resolver
            .resolve(&delegate.address(), &Address::repeat_byte(1))
            .await
            .unwrap());
        assert!(resolver
            .resolve(&delegate.address(), &Address::repeat_byte(2))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut store = MockOrderStore::new();
        store.expect_lookup_delegation().returning(|_| {
            Err(relay_core::Error::Config {
                message: "down".into(),
            })
        });
        let resolver = DelegationResolver::new(Arc::new(store));

        let err = resolver
            .resolve(&Address::repeat_byte(1), &Address::repeat_byte(2))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Store(_)));
    }
}
