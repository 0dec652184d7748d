//! Latency benchmarks for the order intake hot path.
//!
//! Run with: `cargo bench --bench latency`

use alloy_primitives::{Address, B256, U256};
use auth::RelayWallet;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use order_engine::select_quote;
use order_engine::{OrderValidator, QuoteSide};
use relay_core::config::ExchangeSettings;
use relay_core::signing::{hash_order, hash_plain_message};
use relay_core::types::{Order, OrderPayload, OrderRecord};

const NOW: u64 = 1_700_000_000;

fn sample_order(user: Address) -> Order {
    Order {
        user,
        buy_token: Address::repeat_byte(0xbb),
        sell_token: Address::repeat_byte(0xaa),
        buy_amount: U256::from(400_000_000_000_000u64),
        sell_amount: U256::from(1_000_000u64),
        expiration_time_seconds: NOW + 3600,
    }
}

/// Maker orders with prices spread over `depth` levels.
fn generate_book(depth: usize) -> Vec<OrderRecord> {
    (0..depth)
        .map(|i| {
            let mut order = sample_order(Address::repeat_byte(1));
            order.buy_amount = U256::from(1_000 + i as u64 * 7 % 113);
            order.sell_amount = U256::from(1_000u64);
            let mut hash = B256::ZERO;
            hash[..8].copy_from_slice(&(i as u64).to_be_bytes());
            OrderRecord::new(hash, order, String::new(), String::new())
        })
        .collect()
}

fn bench_typed_data_hashing(c: &mut Criterion) {
    let exchange = ExchangeSettings::default();
    let order = sample_order(Address::repeat_byte(0x11));

    let mut group = c.benchmark_group("typed_data");
    group.throughput(Throughput::Elements(1));
    group.bench_function("hash_order", |b| {
        b.iter(|| black_box(hash_order(&exchange.domain, &exchange.types, black_box(&order))))
    });
    group.bench_function("domain_separator", |b| {
        b.iter(|| black_box(exchange.domain.separator()))
    });
    group.bench_function("plain_message", |b| {
        b.iter(|| black_box(hash_plain_message(black_box("cancelorder2:1:0xabc"))))
    });
    group.finish();
}

fn bench_signature_recovery(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let wallet = RelayWallet::random();
    let exchange = ExchangeSettings::default();
    let digest = hash_order(
        &exchange.domain,
        &exchange.types,
        &sample_order(wallet.address()),
    )
    .unwrap();
    let signature = runtime.block_on(wallet.sign_hash_hex(&digest)).unwrap();
    let legacy = format!("{}00", &signature[..signature.len() - 2]);

    let mut group = c.benchmark_group("recovery");
    group.throughput(Throughput::Elements(1));
    group.bench_function("recover", |b| {
        b.iter(|| black_box(auth::recover(black_box(&digest), black_box(&signature))))
    });
    group.bench_function("normalize", |b| {
        b.iter(|| black_box(auth::normalize_signature(black_box(&legacy))))
    });
    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let validator = OrderValidator::default();
    let payload = OrderPayload::from(&sample_order(Address::repeat_byte(0x11)));

    c.bench_function("validate_order", |b| {
        b.iter(|| black_box(validator.validate(black_box(&payload), None, NOW)))
    });
}

fn bench_quote_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("quote_selection");

    for depth in [10, 100, 1000] {
        let book = generate_book(depth);
        let side = QuoteSide::Buy(U256::from(depth as u64 * 500));

        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("select", depth), &book, |b, book| {
            b.iter(|| black_box(select_quote(book.clone(), &side)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_typed_data_hashing,
    bench_signature_recovery,
    bench_validation,
    bench_quote_selection,
);
criterion_main!(benches);
