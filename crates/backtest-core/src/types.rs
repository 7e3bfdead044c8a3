//! Core domain types for the backtesting engine.

pub mod observation;
pub mod portfolio;
pub mod signal;
pub mod trade;

pub use observation::*;
pub use portfolio::*;
pub use signal::*;
pub use trade::*;
