//! Portfolio state owned by a single replay run.

use crate::types::signal::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// An open lot. Owned exclusively by `PortfolioState`; created when a signal
/// is accepted, repriced on every matching observation, removed on close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub unrealized_pnl: Decimal,
    pub opened_at: DateTime<Utc>,
    /// Ledger entry this lot finalizes on close. Gives lots explicit
    /// identity instead of matching "first trade without an exit".
    pub trade_id: Uuid,
    pub strategy: String,
}

impl OpenPosition {
    /// Reprice against the latest close and refresh unrealized PnL.
    pub fn update_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.unrealized_pnl = match self.side {
            Side::Long => (price - self.entry_price) * self.quantity,
            Side::Short => (self.entry_price - price) * self.quantity,
        };
    }

    /// Signed fractional move from entry, positive when the position is in
    /// profit. Used for stop-loss / take-profit checks.
    pub fn return_from_entry(&self) -> Decimal {
        if self.entry_price == Decimal::ZERO {
            return Decimal::ZERO;
        }
        match self.side {
            Side::Long => (self.current_price - self.entry_price) / self.entry_price,
            Side::Short => (self.entry_price - self.current_price) / self.entry_price,
        }
    }
}

/// A single point on the equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

/// Portfolio state threaded through the replay loop. One open lot per
/// symbol; a second entry signal for an already-held symbol is rejected.
///
/// Invariant after every update step:
/// `total_value == cash + Σ(position.current_price × quantity)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioState {
    pub timestamp: DateTime<Utc>,
    pub cash: Decimal,
    pub positions: HashMap<String, OpenPosition>,
    pub total_value: Decimal,
}

impl PortfolioState {
    pub fn new(initial_capital: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cash: initial_capital,
            positions: HashMap::new(),
            total_value: initial_capital,
        }
    }

    /// Recompute `total_value` from cash and marked positions.
    pub fn revalue(&mut self) {
        let position_value: Decimal = self
            .positions
            .values()
            .map(|p| p.current_price * p.quantity)
            .sum();
        self.total_value = self.cash + position_value;
    }
}
