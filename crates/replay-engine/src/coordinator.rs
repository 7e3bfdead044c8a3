//! Backtest coordinator.
//!
//! Composes the replay engine, metrics calculator, walk-forward
//! orchestrator, and Monte Carlo simulator into a single report. The
//! coordinator is the only component that validates configuration; it fails
//! fast on an invalid config and never starts a partial simulation.

use anyhow::Result;
use backtest_core::types::{CompletedTrade, EquityPoint, MarketObservation};
use backtest_core::BacktestConfig;
use risk_metrics::{compute_metrics, daily_returns, run_monte_carlo};
use risk_metrics::{MonteCarloResult, PerformanceMetrics};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::replay::ReplayEngine;
use crate::strategy::StrategyRegistry;
use crate::walk_forward::{run_walk_forward, WalkForwardRecord};

/// Final report for one backtest run. Assembled once; persistence and
/// rendering are caller concerns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub metrics: PerformanceMetrics,
    pub trades: Vec<CompletedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub walk_forward: Vec<WalkForwardRecord>,
    pub monte_carlo: Option<MonteCarloResult>,
}

/// Runs full backtests against a caller-supplied strategy registry.
pub struct BacktestCoordinator {
    registry: StrategyRegistry,
}

impl BacktestCoordinator {
    pub fn new(registry: StrategyRegistry) -> Self {
        Self { registry }
    }

    /// Run a full backtest: one full-period replay, then walk-forward and
    /// Monte Carlo passes when enabled.
    ///
    /// `observations` must be sorted ascending; anything outside the
    /// configured date range is ignored.
    pub fn run(
        &self,
        observations: &[MarketObservation],
        config: &BacktestConfig,
    ) -> Result<BacktestReport> {
        config.validate()?;
        let strategies = self.registry.resolve(&config.strategies)?;

        info!(
            start = %config.start_date,
            end = %config.end_date,
            strategies = strategies.len(),
            "Starting backtest"
        );

        let in_range: Vec<MarketObservation> = observations
            .iter()
            .filter(|o| o.timestamp >= config.start_date && o.timestamp <= config.end_date)
            .cloned()
            .collect();

        let engine = ReplayEngine::from_config(config);
        let (trades, equity_curve) = engine.run(&in_range, &strategies)?;
        let metrics = compute_metrics(&trades, &equity_curve, config.initial_capital, None);

        let walk_forward = if config.walk_forward.enabled {
            run_walk_forward(&in_range, &strategies, config)?
        } else {
            Vec::new()
        };

        let monte_carlo = if config.monte_carlo.enabled {
            Some(run_monte_carlo(
                &daily_returns(&equity_curve),
                config.monte_carlo.simulations,
                config.monte_carlo.confidence_level,
                config.monte_carlo.seed,
            ))
        } else {
            None
        };

        info!(
            total_return = metrics.total_return,
            sharpe = metrics.sharpe_ratio,
            trades = metrics.total_trades,
            windows = walk_forward.len(),
            "Backtest completed"
        );

        Ok(BacktestReport {
            metrics,
            trades,
            equity_curve,
            walk_forward,
            monte_carlo,
        })
    }
}
