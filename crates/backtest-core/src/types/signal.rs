//! Trading signals emitted by strategies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

/// A trade request produced by a strategy. Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub strategy_name: String,
}

impl Signal {
    pub fn new(
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        strategy_name: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
            strategy_name: strategy_name.to_string(),
        }
    }
}
