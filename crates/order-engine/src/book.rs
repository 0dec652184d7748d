//! Price ordering and quote selection over maker orders.
//!
//! Prices are compared by cross-multiplying into `U512`, so every store
//! ranks orders identically regardless of how it keeps amounts.

use std::cmp::Ordering;

use alloy_primitives::{U256, U512};
use relay_core::types::OrderRecord;

use crate::ports::QuoteSide;

/// Order by maker price (`buy_amount / sell_amount`), oldest first on ties.
pub fn by_price(a: &OrderRecord, b: &OrderRecord) -> Ordering {
    let lhs: U512 = a.order.buy_amount.widening_mul(b.order.sell_amount);
    let rhs: U512 = b.order.buy_amount.widening_mul(a.order.sell_amount);
    lhs.cmp(&rhs).then(a.created_at.cmp(&b.created_at))
}

/// How much of the quoted amount a maker order can cover.
fn capacity(record: &OrderRecord, side: &QuoteSide) -> U256 {
    match side {
        QuoteSide::Buy(_) => record.unfilled,
        QuoteSide::Sell(_) => record
            .unfilled
            .saturating_mul(record.order.buy_amount)
            .checked_div(record.order.sell_amount)
            .unwrap_or_default(),
    }
}

/// Walk `candidates` best price first and keep orders until the requested
/// amount is covered.
pub fn select_quote(mut candidates: Vec<OrderRecord>, side: &QuoteSide) -> Vec<OrderRecord> {
    let target = match side {
        QuoteSide::Buy(amount) | QuoteSide::Sell(amount) => *amount,
    };
    candidates.sort_by(by_price);

    let mut covered = U256::ZERO;
    let mut selected = Vec::new();
    for record in candidates {
        if covered >= target {
            break;
        }
        covered = covered.saturating_add(capacity(&record, side));
        selected.push(record);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};
    use chrono::{Duration, Utc};
    use relay_core::types::Order;

    fn record(id: u8, buy: U256, sell: U256) -> OrderRecord {
        let mut record = OrderRecord::new(
            B256::repeat_byte(id),
            Order {
                user: Address::repeat_byte(0xaa),
                buy_token: Address::repeat_byte(1),
                sell_token: Address::repeat_byte(2),
                buy_amount: buy,
                sell_amount: sell,
                expiration_time_seconds: 100,
            },
            "0x".into(),
            String::new(),
        );
        record.created_at = Utc::now() + Duration::seconds(id as i64);
        record
    }

    fn small(id: u8, buy: u64, sell: u64) -> OrderRecord {
        record(id, U256::from(buy), U256::from(sell))
    }

    #[test]
    fn test_select_quote_stops_once_covered() {
        // Makers selling token 2 for token 1, prices 0.5, 1 and 2.
        let a = small(1, 5, 10);
        let b = small(2, 10, 10);
        let c = small(3, 20, 10);

        let picked = select_quote(
            vec![c.clone(), a.clone(), b.clone()],
            &QuoteSide::Buy(U256::from(15)),
        );
        let hashes: Vec<B256> = picked.iter().map(|r| r.hash).collect();
        assert_eq!(hashes, vec![a.hash, b.hash]);

        // Spending 5 of the taker's token is absorbed by the cheapest maker.
        let picked = select_quote(vec![c, a.clone(), b], &QuoteSide::Sell(U256::from(5)));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].hash, a.hash);
    }

    #[test]
    fn test_near_equal_prices_rank_exactly() {
        // 10^40 / (10^40 + 1) vs 10^40 / (10^40 + 2): equal to 39 digits.
        let base = U256::from(10u64).pow(U256::from(40u64));
        let older_dearer = record(1, base, base + U256::from(1u64));
        let newer_cheaper = record(2, base, base + U256::from(2u64));

        assert_eq!(by_price(&newer_cheaper, &older_dearer), Ordering::Less);

        let mut book = vec![older_dearer.clone(), newer_cheaper.clone()];
        book.sort_by(by_price);
        assert_eq!(book[0].hash, newer_cheaper.hash);
    }

    #[test]
    fn test_equal_prices_fall_back_to_age() {
        let older = small(1, 2, 4);
        let newer = small(2, 1, 2);
        assert_eq!(by_price(&older, &newer), Ordering::Less);
    }
}
