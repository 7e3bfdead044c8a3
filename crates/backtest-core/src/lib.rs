//! Backtest Core Library
//!
//! Shared domain types, configuration, and error taxonomy for the backtesting
//! engine.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    BacktestConfig, MonteCarloSettings, PositionSizing, RiskSettings, WalkForwardSettings,
};
pub use error::{Error, Result};
