use alloy::primitives::{Address, U256};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lpdesk::liquidity::{WithdrawInput, WithdrawalCalculator};
use lpdesk::math::{ExactAmount, Percent};
use lpdesk::models::{PoolSnapshot, Token};

/// Generate a random token address
fn random_address() -> Address {
    let mut bytes = [0u8; 20];
    bytes.iter_mut().for_each(|b| *b = fastrand::u8(..));
    Address::from(bytes)
}

/// Generate pools with random 18-decimal reserves and a position in each
fn generate_positions(count: usize) -> Vec<(PoolSnapshot, ExactAmount)> {
    (0..count)
        .map(|i| {
            let token0 = Token::new(137, random_address(), 18, format!("T{i}A"));
            let token1 = Token::new(137, random_address(), 6, format!("T{i}B"));
            let lp = Token::new(137, random_address(), 18, format!("LP{i}"));
            let scale = U256::from(10).pow(U256::from(18));
            let supply = U256::from(fastrand::u64(1_000..1_000_000_000)) * scale;
            let pool = PoolSnapshot::new(
                lp.clone(),
                token0,
                token1,
                U256::from(fastrand::u64(1..u64::MAX)) * scale,
                U256::from(fastrand::u64(1..u64::MAX)),
                supply,
            )
            .unwrap();
            let balance = ExactAmount::from_raw(lp, supply / U256::from(fastrand::u64(1..1_000)));
            (pool, balance)
        })
        .collect()
}

fn bench_quote(c: &mut Criterion) {
    let calculator = WithdrawalCalculator::default();
    let mut group = c.benchmark_group("withdraw_quote");

    for count in [10, 100, 1_000] {
        let positions = generate_positions(count);
        group.bench_with_input(BenchmarkId::new("percent", count), &positions, |b, positions| {
            let input = WithdrawInput::Percent(Percent::from_whole(37));
            b.iter(|| {
                for (pool, balance) in positions {
                    black_box(calculator.quote(pool, balance, &input).unwrap());
                }
            });
        });
        group.bench_with_input(BenchmarkId::new("liquidity", count), &positions, |b, positions| {
            b.iter(|| {
                for (pool, balance) in positions {
                    let input = WithdrawInput::Liquidity(ExactAmount::from_raw(
                        balance.token().clone(),
                        balance.raw() / U256::from(3),
                    ));
                    black_box(calculator.quote(pool, balance, &input).unwrap());
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_quote);
criterion_main!(benches);
