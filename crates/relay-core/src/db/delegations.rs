//! Database operations for signer delegations.

use super::{address_text, parse_address};
use crate::Result;
use alloy_primitives::Address;
use sqlx::{PgPool, Row};

/// Repository for the `delegations` table (`signer -> owner`).
#[derive(Clone)]
pub struct DelegationRepository {
    pool: PgPool,
}

impl DelegationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Owner the `signer` key may act for, if any.
    pub async fn lookup(&self, signer: &Address) -> Result<Option<Address>> {
        let row = sqlx::query("SELECT owner_address FROM delegations WHERE signer_address = $1")
            .bind(address_text(signer))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let owner: String = row.try_get("owner_address")?;
                Ok(Some(parse_address(&owner)?))
            }
            None => Ok(None),
        }
    }

    /// Register `signer` as a delegate of `owner`, replacing any earlier
    /// registration of the same signer.
    pub async fn register(&self, signer: &Address, owner: &Address) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO delegations (signer_address, owner_address)
            VALUES ($1, $2)
            ON CONFLICT (signer_address) DO UPDATE SET
                owner_address = EXCLUDED.owner_address,
                updated_at = NOW()
            "#,
        )
        .bind(address_text(signer))
        .bind(address_text(owner))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
