//! Risk Metrics
//!
//! Performance/risk metric calculation and Monte Carlo resampling for
//! backtest results.

pub mod metrics;
pub mod monte_carlo;

pub use metrics::{compute_metrics, daily_returns, PerformanceMetrics, DEFAULT_RISK_FREE_RATE};
pub use monte_carlo::{run_monte_carlo, MonteCarloResult};
