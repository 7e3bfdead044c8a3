//! Replay throughput benchmarks.
//!
//! Run with: `cargo bench --bench replay`

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;

use backtest_core::types::{MarketObservation, Side, Signal};
use backtest_core::{
    BacktestConfig, MonteCarloSettings, RiskSettings, WalkForwardSettings,
};
use replay_engine::{ReplayEngine, Strategy};
use risk_metrics::run_monte_carlo;

/// Honors `RUST_LOG`; engine logs stay quiet unless asked for.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn bench_config(days: i64) -> BacktestConfig {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    BacktestConfig {
        start_date: start,
        end_date: start + Duration::days(days),
        initial_capital: Decimal::new(1_000_000, 0),
        commission: Decimal::new(1, 3),
        slippage: Decimal::new(5, 4),
        instruments: vec!["BTC-USD".to_string()],
        strategies: vec!["churner".to_string()],
        walk_forward: WalkForwardSettings::default(),
        monte_carlo: MonteCarloSettings::default(),
        risk_management: RiskSettings::default(),
    }
}

/// Generate a random daily price series around a base price.
fn generate_observations(count: usize) -> Vec<MarketObservation> {
    let mut rng = rand::thread_rng();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut price = 100.0_f64;

    (0..count)
        .map(|i| {
            price *= 1.0 + rng.gen_range(-0.02..0.02);
            let close = Decimal::new((price * 100.0) as i64, 2);
            MarketObservation::flat("BTC-USD", start + Duration::days(i as i64), close)
        })
        .collect()
}

/// Alternates entries and exits every few bars.
struct Churner;

impl Strategy for Churner {
    fn name(&self) -> &str {
        "churner"
    }

    fn generate_signals(&self, observations: &[MarketObservation]) -> anyhow::Result<Vec<Signal>> {
        let obs = &observations[0];
        Ok(vec![Signal::new(
            &obs.symbol,
            Side::Long,
            Decimal::new(10, 0),
            obs.close,
            "churner",
        )])
    }

    fn should_exit(
        &self,
        position: &backtest_core::types::OpenPosition,
        observations: &[MarketObservation],
    ) -> anyhow::Result<bool> {
        Ok(observations[0].timestamp.signed_duration_since(position.opened_at)
            >= Duration::days(5))
    }
}

fn bench_replay(c: &mut Criterion) {
    init_tracing();
    let mut group = c.benchmark_group("replay");

    for size in [250, 1_000, 5_000].iter() {
        let observations = generate_observations(*size);
        let strategies: Vec<Arc<dyn Strategy>> = vec![Arc::new(Churner)];
        let engine = ReplayEngine::from_config(&bench_config(*size as i64));

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(
            BenchmarkId::new("run", size),
            &observations,
            |b, observations| {
                b.iter(|| {
                    let result = engine.run(black_box(observations), &strategies).unwrap();
                    black_box(result)
                })
            },
        );
    }

    group.finish();
}

fn bench_monte_carlo(c: &mut Criterion) {
    let mut group = c.benchmark_group("monte_carlo");

    let mut rng = rand::thread_rng();
    let returns: Vec<f64> = (0..252).map(|_| rng.gen_range(-0.03..0.03)).collect();

    for sims in [1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*sims as u64));
        group.bench_with_input(BenchmarkId::new("bootstrap", sims), sims, |b, &sims| {
            b.iter(|| black_box(run_monte_carlo(black_box(&returns), sims, 0.95, 42)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_replay, bench_monte_carlo);
criterion_main!(benches);
