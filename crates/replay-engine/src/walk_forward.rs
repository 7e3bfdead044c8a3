//! Walk-forward orchestration.
//!
//! Partitions the configured date range into successive (training, testing)
//! windows and replays each one independently. Windows share only the
//! read-only observation slice, so they run in parallel; results are
//! collected in window order.

use anyhow::{ensure, Result};
use backtest_core::types::{CompletedTrade, EquityPoint, MarketObservation};
use backtest_core::BacktestConfig;
use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use risk_metrics::{compute_metrics, PerformanceMetrics};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::replay::ReplayEngine;
use crate::strategy::Strategy;

/// Whether a window was carved for training or testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Training,
    Testing,
}

/// Half-open `[start, end)` window within the backtest range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: WindowKind,
}

/// Result of replaying one window. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardRecord {
    pub period: WindowPeriod,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<CompletedTrade>,
    pub equity: Vec<EquityPoint>,
}

/// Run walk-forward analysis. Each window gets a fresh portfolio seeded with
/// `initial_capital`; windows never share state. Gaps between consecutive
/// windows (when `step_size > window_size + min_test_period`) are allowed.
pub fn run_walk_forward(
    observations: &[MarketObservation],
    strategies: &[Arc<dyn Strategy>],
    config: &BacktestConfig,
) -> Result<Vec<WalkForwardRecord>> {
    // A non-positive step would never advance the cursor
    ensure!(
        config.walk_forward.window_size > 0
            && config.walk_forward.step_size > 0
            && config.walk_forward.min_test_period > 0,
        "walk-forward durations must be positive: window {}, step {}, test {}",
        config.walk_forward.window_size,
        config.walk_forward.step_size,
        config.walk_forward.min_test_period,
    );

    let windows = carve_windows(config);
    info!(windows = windows.len(), "Starting walk-forward analysis");

    let engine = ReplayEngine::from_config(config);
    let records: Result<Vec<(WalkForwardRecord, WalkForwardRecord)>> = windows
        .par_iter()
        .map(|(train, test)| {
            let train_record = replay_window(&engine, observations, strategies, *train, config)?;
            let test_record = replay_window(&engine, observations, strategies, *test, config)?;
            Ok((train_record, test_record))
        })
        .collect();

    let mut flat = Vec::new();
    for (train, test) in records? {
        flat.push(train);
        flat.push(test);
    }
    Ok(flat)
}

/// Carve (training, testing) window pairs. Stops as soon as the testing
/// window would extend past `end_date`.
fn carve_windows(config: &BacktestConfig) -> Vec<(WindowPeriod, WindowPeriod)> {
    let window = Duration::days(config.walk_forward.window_size);
    let step = Duration::days(config.walk_forward.step_size);
    let test = Duration::days(config.walk_forward.min_test_period);

    let mut windows = Vec::new();
    let mut cursor = config.start_date;
    loop {
        let train_end = cursor + window;
        let test_end = train_end + test;
        if test_end > config.end_date {
            break;
        }
        windows.push((
            WindowPeriod {
                start: cursor,
                end: train_end,
                kind: WindowKind::Training,
            },
            WindowPeriod {
                start: train_end,
                end: test_end,
                kind: WindowKind::Testing,
            },
        ));
        cursor += step;
    }
    windows
}

fn replay_window(
    engine: &ReplayEngine,
    observations: &[MarketObservation],
    strategies: &[Arc<dyn Strategy>],
    period: WindowPeriod,
    config: &BacktestConfig,
) -> Result<WalkForwardRecord> {
    let slice = slice_for(observations, period.start, period.end);

    // A window with no observations yields zeroed metrics, not a failure
    if slice.is_empty() {
        return Ok(WalkForwardRecord {
            period,
            metrics: PerformanceMetrics::zeroed(),
            trades: Vec::new(),
            equity: Vec::new(),
        });
    }

    let (trades, equity) = engine.run(slice, strategies)?;
    let metrics = compute_metrics(&trades, &equity, config.initial_capital, None);
    Ok(WalkForwardRecord {
        period,
        metrics,
        trades,
        equity,
    })
}

/// Half-open slice of a sorted series via binary search.
fn slice_for(
    observations: &[MarketObservation],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> &[MarketObservation] {
    let lo = observations.partition_point(|o| o.timestamp < start);
    let hi = observations.partition_point(|o| o.timestamp < end);
    &observations[lo..hi]
}
