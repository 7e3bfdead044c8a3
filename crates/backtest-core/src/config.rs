//! Configuration surface for a backtest run.
//!
//! A `BacktestConfig` is validated once, synchronously, before any simulation
//! starts. Invalid configuration is the only fatal error class: everything
//! downstream recovers locally.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-level configuration for a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Start of the simulated period (inclusive).
    pub start_date: DateTime<Utc>,
    /// End of the simulated period (inclusive).
    pub end_date: DateTime<Utc>,
    /// Initial portfolio cash.
    pub initial_capital: Decimal,
    /// Commission as a fraction of trade value (e.g. 0.001 for 10 bps).
    pub commission: Decimal,
    /// Slippage as a fraction of trade value.
    pub slippage: Decimal,
    /// Symbols included in the run.
    pub instruments: Vec<String>,
    /// Names of registered strategies to run.
    pub strategies: Vec<String>,
    /// Walk-forward analysis settings.
    pub walk_forward: WalkForwardSettings,
    /// Monte Carlo resampling settings.
    pub monte_carlo: MonteCarloSettings,
    /// Risk management settings applied during replay.
    pub risk_management: RiskSettings,
}

/// Rolling train/test window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardSettings {
    pub enabled: bool,
    /// Training window length in days.
    pub window_size: i64,
    /// Days the cursor advances between windows.
    pub step_size: i64,
    /// Testing window length in days.
    pub min_test_period: i64,
}

impl Default for WalkForwardSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            window_size: 180,
            step_size: 30,
            min_test_period: 30,
        }
    }
}

/// Bootstrap resampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloSettings {
    pub enabled: bool,
    /// Number of resampled return paths.
    pub simulations: usize,
    /// Confidence level for worst/best case bounds (e.g. 0.95).
    pub confidence_level: f64,
    /// Seed for the bootstrap sampler. Same seed, same distribution.
    pub seed: u64,
}

impl Default for MonteCarloSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            simulations: 1000,
            confidence_level: 0.95,
            seed: 0,
        }
    }
}

/// Per-position risk limits enforced by the replay engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSettings {
    /// Maximum tolerated portfolio drawdown, as a fraction of peak.
    pub max_drawdown: Decimal,
    /// Exit when a position loses this fraction from entry.
    pub stop_loss_pct: Decimal,
    /// Exit when a position gains this fraction from entry.
    pub take_profit_pct: Decimal,
    /// How signal quantities are interpreted by strategies.
    pub position_sizing: PositionSizing,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            max_drawdown: Decimal::new(25, 2),   // 25%
            stop_loss_pct: Decimal::new(5, 2),   // 5%
            take_profit_pct: Decimal::new(10, 2), // 10%
            position_sizing: PositionSizing::FixedQuantity,
        }
    }
}

/// Position sizing policy. Sizing itself happens inside strategies; the
/// engine only records which policy was in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PositionSizing {
    /// Signals carry an absolute quantity.
    #[default]
    FixedQuantity,
    /// Signals size positions as a fraction of portfolio value.
    PortfolioFraction,
}

impl BacktestConfig {
    /// Validate the configuration. Called by the coordinator before any
    /// simulation starts; a failure here aborts the whole run.
    pub fn validate(&self) -> Result<()> {
        if self.end_date <= self.start_date {
            return Err(Error::config("end_date must be after start_date"));
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(Error::config("initial_capital must be positive"));
        }
        if self.commission < Decimal::ZERO {
            return Err(Error::config("commission cannot be negative"));
        }
        if self.slippage < Decimal::ZERO {
            return Err(Error::config("slippage cannot be negative"));
        }
        if self.risk_management.stop_loss_pct < Decimal::ZERO
            || self.risk_management.take_profit_pct < Decimal::ZERO
        {
            return Err(Error::config("stop_loss/take_profit cannot be negative"));
        }
        if self.walk_forward.enabled {
            if self.walk_forward.window_size <= 0 {
                return Err(Error::config("walk_forward.window_size must be positive"));
            }
            if self.walk_forward.step_size <= 0 {
                return Err(Error::config("walk_forward.step_size must be positive"));
            }
            if self.walk_forward.min_test_period <= 0 {
                return Err(Error::config(
                    "walk_forward.min_test_period must be positive",
                ));
            }
        }
        if self.monte_carlo.enabled {
            if self.monte_carlo.simulations == 0 {
                return Err(Error::config("monte_carlo.simulations must be positive"));
            }
            if self.monte_carlo.confidence_level <= 0.0
                || self.monte_carlo.confidence_level >= 1.0
            {
                return Err(Error::config(
                    "monte_carlo.confidence_level must be in (0, 1)",
                ));
            }
        }
        Ok(())
    }
}
