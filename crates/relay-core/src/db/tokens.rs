//! Database operations for the token registry.

use super::{address_text, parse_address};
use crate::types::TokenInfo;
use crate::{Error, Result};
use sqlx::{PgPool, Row};

/// Repository for the `token_infos` table.
#[derive(Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every admitted token.
    pub async fn list(&self) -> Result<Vec<TokenInfo>> {
        let rows = sqlx::query(
            "SELECT address, symbol, name, decimals FROM token_infos ORDER BY symbol",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<TokenInfo> {
                let address: String = row.try_get("address")?;
                let decimals: i16 = row.try_get("decimals")?;
                Ok(TokenInfo {
                    address: parse_address(&address)?,
                    symbol: row.try_get("symbol")?,
                    name: row.try_get("name")?,
                    decimals: u8::try_from(decimals)
                        .map_err(|_| Error::corrupt(format!("invalid decimals {decimals}")))?,
                })
            })
            .collect()
    }

    /// Admit a token. Returns `false` if the address is already registered.
    pub async fn insert(&self, token: &TokenInfo) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO token_infos (address, symbol, name, decimals)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (address) DO NOTHING
            "#,
        )
        .bind(address_text(&token.address))
        .bind(&token.symbol)
        .bind(&token.name)
        .bind(i16::from(token.decimals))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
