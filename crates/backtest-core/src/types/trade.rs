//! Trade ledger entries.

use crate::types::signal::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ledger entry for a single round-trip trade. Created at entry with the
/// exit fields unset; finalized exactly once at close. A trade with
/// `exit_price.is_some()` is terminal and never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedTrade {
    pub id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    /// Realized PnL net of commission and slippage on both legs.
    pub pnl: Option<Decimal>,
    /// Commission paid across both legs so far.
    pub commission: Decimal,
    /// Slippage cost across both legs so far.
    pub slippage: Decimal,
    pub strategy: String,
}

impl CompletedTrade {
    /// Open a new ledger entry at trade entry.
    pub fn open(
        id: Uuid,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        entry_price: Decimal,
        entry_time: DateTime<Utc>,
        commission: Decimal,
        slippage: Decimal,
        strategy: &str,
    ) -> Self {
        Self {
            id,
            symbol: symbol.to_string(),
            side,
            quantity,
            entry_price,
            exit_price: None,
            entry_time,
            exit_time: None,
            pnl: None,
            commission,
            slippage,
            strategy: strategy.to_string(),
        }
    }

    /// Whether this trade has been finalized.
    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    /// Finalize the entry with exit details. Exit-leg costs are added on top
    /// of the entry-leg costs recorded at open.
    pub fn finalize(
        &mut self,
        exit_price: Decimal,
        exit_time: DateTime<Utc>,
        pnl: Decimal,
        exit_commission: Decimal,
        exit_slippage: Decimal,
    ) {
        debug_assert!(!self.is_closed(), "trade finalized twice");
        self.exit_price = Some(exit_price);
        self.exit_time = Some(exit_time);
        self.pnl = Some(pnl);
        self.commission += exit_commission;
        self.slippage += exit_slippage;
    }
}
