//! Tradesim: Historical Strategy Backtesting and Risk Evaluation
//!
//! This is the root crate that provides benchmark and integration-test
//! access to the internal modules. For actual functionality, use the
//! individual crates directly:
//!
//! - `backtest-core`: Domain types, configuration, error taxonomy
//! - `replay-engine`: Portfolio replay, walk-forward, coordinator
//! - `risk-metrics`: Performance metrics, Monte Carlo resampling

// Re-export for benchmarks
pub use backtest_core as core;
pub use replay_engine as replay;
pub use risk_metrics as metrics;
