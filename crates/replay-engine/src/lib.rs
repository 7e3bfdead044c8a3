//! Replay Engine
//!
//! Historical simulation core: portfolio replay, walk-forward orchestration,
//! and the backtest coordinator.
//!
//! # Features
//!
//! - **Strategy Trait**: Narrow signal/exit interface for pluggable strategies
//! - **Portfolio Replay**: Time-ordered replay with commission, slippage, and
//!   percentage stop-loss/take-profit exits
//! - **Walk-Forward**: Rolling train/test windows over the same replay core
//! - **Coordinator**: Full-period replay plus optional walk-forward and
//!   Monte Carlo passes, assembled into one report
//!
//! # Example
//!
//! ```ignore
//! use replay_engine::{BacktestCoordinator, StrategyRegistry};
//!
//! let mut registry = StrategyRegistry::new();
//! registry.register(Arc::new(MyStrategy::default()));
//!
//! let coordinator = BacktestCoordinator::new(registry);
//! let report = coordinator.run(&observations, &config)?;
//! println!("Return: {:.2}%", report.metrics.total_return * 100.0);
//! ```

pub mod coordinator;
pub mod replay;
pub mod strategy;
pub mod walk_forward;

// Re-exports
pub use coordinator::{BacktestCoordinator, BacktestReport};
pub use replay::ReplayEngine;
pub use strategy::{Strategy, StrategyRegistry};
pub use walk_forward::{run_walk_forward, WalkForwardRecord, WindowKind, WindowPeriod};
