//! Database operations for relayed orders.

use super::{address_text, parse_address, parse_amount};
use crate::types::{render_hash, Order, OrderFilter, OrderRecord};
use crate::{Error, Result};
use alloy_primitives::{Address, B256};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// Maximum rows returned by id and per-user lookups.
pub const ORDER_LOOKUP_LIMIT: i64 = 25;

const ORDER_COLUMNS: &str = r#"
    hash, user_address, buy_token, sell_token,
    buy_amount::text AS buy_amount, sell_amount::text AS sell_amount,
    expires, unfilled::text AS unfilled, signature, cancel_token, created_at
"#;

/// Repository for the `orders` table.
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new order. Returns `false` when an order with the same hash
    /// already exists.
    pub async fn insert(&self, record: &OrderRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                hash, user_address, buy_token, sell_token,
                buy_amount, sell_amount, expires, unfilled,
                signature, cancel_token, created_at
            )
            VALUES ($1, $2, $3, $4, $5::numeric, $6::numeric, $7, $8::numeric, $9, $10, $11)
            ON CONFLICT (hash) DO NOTHING
            "#,
        )
        .bind(render_hash(&record.hash))
        .bind(address_text(&record.order.user))
        .bind(address_text(&record.order.buy_token))
        .bind(address_text(&record.order.sell_token))
        .bind(record.order.buy_amount.to_string())
        .bind(record.order.sell_amount.to_string())
        .bind(expires_param(record.order.expiration_time_seconds))
        .bind(record.unfilled.to_string())
        .bind(&record.signature)
        .bind(&record.cancel_token)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete the order with `hash` placed by `owner`.
    pub async fn delete_by_hash_and_owner(&self, hash: &B256, owner: &Address) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE hash = $1 AND user_address = $2")
            .bind(render_hash(hash))
            .bind(address_text(owner))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete the order with `hash` whose cancel token matches.
    pub async fn delete_by_hash_and_token(&self, hash: &B256, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE hash = $1 AND cancel_token = $2")
            .bind(render_hash(hash))
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Open orders for a directed pair, oldest first.
    ///
    /// `NUMERIC` division rounds, so price ordering is left to the caller,
    /// which compares prices exactly.
    pub async fn query_by_filter(&self, filter: &OrderFilter) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE buy_token = $1 AND sell_token = $2
              AND unfilled > 0
              AND ($3::bigint IS NULL OR expires > $3)
            ORDER BY created_at ASC
            "#
        ))
        .bind(address_text(&filter.buy_token))
        .bind(address_text(&filter.sell_token))
        .bind(filter.expires_after.map(expires_param))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Orders by id, at most [`ORDER_LOOKUP_LIMIT`].
    pub async fn get_by_hashes(&self, hashes: &[B256]) -> Result<Vec<OrderRecord>> {
        let ids: Vec<String> = hashes.iter().map(render_hash).collect();
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE hash = ANY($1) LIMIT $2"
        ))
        .bind(&ids)
        .bind(ORDER_LOOKUP_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Open orders placed by `user`, newest first.
    pub async fn get_user_orders(&self, user: &Address) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE user_address = $1 AND unfilled > 0
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(address_text(user))
        .bind(ORDER_LOOKUP_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Delete every order expiring at or before `cutoff`.
    pub async fn delete_expired(&self, cutoff: u64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM orders WHERE expires <= $1")
            .bind(expires_param(cutoff))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Distinct `(buy_token, sell_token)` pairs among orders live at `now`.
    pub async fn distinct_pairs(&self, now: u64) -> Result<Vec<(Address, Address)>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT buy_token, sell_token
            FROM orders
            WHERE expires > $1
            ORDER BY buy_token, sell_token
            "#,
        )
        .bind(expires_param(now))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<(Address, Address)> {
                let buy: String = row.try_get("buy_token")?;
                let sell: String = row.try_get("sell_token")?;
                Ok((parse_address(&buy)?, parse_address(&sell)?))
            })
            .collect()
    }
}

fn expires_param(seconds: u64) -> i64 {
    i64::try_from(seconds).unwrap_or(i64::MAX)
}

fn row_to_record(row: &PgRow) -> Result<OrderRecord> {
    let hash: String = row.try_get("hash")?;
    let user: String = row.try_get("user_address")?;
    let buy_token: String = row.try_get("buy_token")?;
    let sell_token: String = row.try_get("sell_token")?;
    let buy_amount: String = row.try_get("buy_amount")?;
    let sell_amount: String = row.try_get("sell_amount")?;
    let expires: i64 = row.try_get("expires")?;
    let unfilled: String = row.try_get("unfilled")?;

    Ok(OrderRecord {
        hash: hash
            .parse()
            .map_err(|_| Error::corrupt(format!("invalid stored hash {hash}")))?,
        order: Order {
            user: parse_address(&user)?,
            buy_token: parse_address(&buy_token)?,
            sell_token: parse_address(&sell_token)?,
            buy_amount: parse_amount(&buy_amount)?,
            sell_amount: parse_amount(&sell_amount)?,
            expiration_time_seconds: u64::try_from(expires)
                .map_err(|_| Error::corrupt(format!("negative expiry {expires}")))?,
        },
        unfilled: parse_amount(&unfilled)?,
        signature: row.try_get("signature")?,
        cancel_token: row.try_get("cancel_token")?,
        created_at: row.try_get("created_at")?,
    })
}
