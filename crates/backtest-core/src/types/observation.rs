//! Market observations: one OHLCV bar per symbol per timestamp.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single historical price bar. The replay engine assumes input is sorted
/// ascending by timestamp and filtered to the configured date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketObservation {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl MarketObservation {
    /// Flat bar at a single price, used heavily in tests.
    pub fn flat(symbol: &str, timestamp: DateTime<Utc>, price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: Decimal::ZERO,
        }
    }
}

/// Check that a series is sorted ascending by timestamp.
pub fn is_sorted_ascending(observations: &[MarketObservation]) -> bool {
    observations
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp)
}
