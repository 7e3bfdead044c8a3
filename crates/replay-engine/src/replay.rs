//! Portfolio replay engine.
//!
//! Advances a `PortfolioState` through a time-ordered observation series,
//! invoking strategies for signals and exit checks and producing a trade
//! ledger plus an equity curve. A single run is strictly sequential, since
//! positions must see prices in chronological order; separate runs are
//! independent and may execute in parallel.

use anyhow::{ensure, Result};
use backtest_core::types::{
    is_sorted_ascending, CompletedTrade, EquityPoint, MarketObservation, OpenPosition,
    PortfolioState, Side, Signal,
};
use backtest_core::BacktestConfig;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::strategy::Strategy;

/// Replay parameters extracted from a `BacktestConfig`. The engine itself is
/// stateless across runs; each `run` call owns a fresh `PortfolioState`.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    initial_capital: Decimal,
    commission: Decimal,
    slippage: Decimal,
    stop_loss_pct: Decimal,
    take_profit_pct: Decimal,
}

impl ReplayEngine {
    pub fn from_config(config: &BacktestConfig) -> Self {
        Self {
            initial_capital: config.initial_capital,
            commission: config.commission,
            slippage: config.slippage,
            stop_loss_pct: config.risk_management.stop_loss_pct,
            take_profit_pct: config.risk_management.take_profit_pct,
        }
    }

    /// Replay `observations` against `strategies`.
    ///
    /// Preconditions: observations sorted ascending by timestamp and already
    /// restricted to the configured date range; initial capital positive.
    /// Returns the finalized trade ledger and the equity curve, one point per
    /// distinct timestamp. Positions still open after the last observation
    /// are force-closed at the last observed price, never silently dropped.
    pub fn run(
        &self,
        observations: &[MarketObservation],
        strategies: &[Arc<dyn Strategy>],
    ) -> Result<(Vec<CompletedTrade>, Vec<EquityPoint>)> {
        ensure!(
            self.initial_capital > Decimal::ZERO,
            "initial capital must be positive"
        );
        ensure!(
            is_sorted_ascending(observations),
            "observations must be sorted ascending by timestamp"
        );

        let by_name: HashMap<&str, &Arc<dyn Strategy>> =
            strategies.iter().map(|s| (s.name(), s)).collect();

        let start_timestamp = observations
            .first()
            .map(|o| o.timestamp)
            .unwrap_or_else(Utc::now);
        let mut state = PortfolioState::new(self.initial_capital, start_timestamp);
        let mut ledger: Vec<CompletedTrade> = Vec::new();
        let mut equity: Vec<EquityPoint> = Vec::new();
        let mut last_price: HashMap<String, Decimal> = HashMap::new();

        info!(
            strategies = strategies.len(),
            observations = observations.len(),
            "Starting replay"
        );

        // Observations sharing a timestamp form one time step
        let mut cursor = 0;
        while cursor < observations.len() {
            let timestamp = observations[cursor].timestamp;
            let mut step_end = cursor + 1;
            while step_end < observations.len() && observations[step_end].timestamp == timestamp {
                step_end += 1;
            }
            let step = &observations[cursor..step_end];
            cursor = step_end;

            state.timestamp = timestamp;

            // 1. Reprice open positions at the latest close
            for obs in step {
                if let Some(position) = state.positions.get_mut(&obs.symbol) {
                    position.update_price(obs.close);
                }
                last_price.insert(obs.symbol.clone(), obs.close);
            }
            state.revalue();

            // 2. Collect signals, isolating per-strategy faults
            let mut signals: Vec<Signal> = Vec::new();
            for strategy in strategies {
                match strategy.generate_signals(step) {
                    Ok(generated) => signals.extend(generated),
                    Err(error) => {
                        warn!(
                            strategy = strategy.name(),
                            %error,
                            "Strategy signal generation failed; skipping this step"
                        );
                    }
                }
            }

            // 3. Execute signals
            for signal in &signals {
                self.execute_signal(signal, timestamp, &mut state, &mut ledger);
            }

            // 4. Exit checks for positions with a fresh price
            for obs in step {
                let should_close = match state.positions.get(&obs.symbol) {
                    Some(position) => self.exit_triggered(position, step, &by_name),
                    None => false,
                };
                if should_close {
                    self.close_position(&obs.symbol, obs.close, timestamp, &mut state, &mut ledger);
                }
            }
            state.revalue();

            // 5. Equity snapshot, one per distinct timestamp
            equity.push(EquityPoint {
                timestamp,
                value: state.total_value,
            });
        }

        // Force-close whatever is still open at the final observed price
        let open_symbols: Vec<String> = state.positions.keys().cloned().collect();
        for symbol in open_symbols {
            let price = last_price
                .get(&symbol)
                .copied()
                .unwrap_or_else(|| state.positions[&symbol].current_price);
            debug!(%symbol, %price, "Force-closing position at end of replay");
            self.close_position(&symbol, price, state.timestamp, &mut state, &mut ledger);
        }

        info!(
            trades = ledger.len(),
            final_value = %state.total_value,
            "Replay completed"
        );

        Ok((ledger, equity))
    }

    /// Attempt to open a position for a signal. Rejections (insufficient
    /// cash, overlapping entry) are logged and absorbed; the run continues.
    fn execute_signal(
        &self,
        signal: &Signal,
        timestamp: DateTime<Utc>,
        state: &mut PortfolioState,
        ledger: &mut Vec<CompletedTrade>,
    ) {
        if signal.quantity <= Decimal::ZERO || signal.price <= Decimal::ZERO {
            debug!(symbol = %signal.symbol, "Signal with non-positive quantity or price dropped");
            return;
        }

        // One open lot per symbol: a second entry before the prior lot
        // closes is rejected rather than silently replacing it
        if state.positions.contains_key(&signal.symbol) {
            warn!(
                symbol = %signal.symbol,
                strategy = %signal.strategy_name,
                "Rejecting signal: position already open for symbol"
            );
            return;
        }

        let gross = signal.quantity * signal.price;
        let required_cash = gross * (Decimal::ONE + self.commission + self.slippage);
        if required_cash > state.cash {
            warn!(
                symbol = %signal.symbol,
                required = %required_cash,
                cash = %state.cash,
                "Rejecting signal: insufficient funds"
            );
            return;
        }

        state.cash -= required_cash;

        let trade = CompletedTrade::open(
            signal.id,
            &signal.symbol,
            signal.side,
            signal.quantity,
            signal.price,
            timestamp,
            gross * self.commission,
            gross * self.slippage,
            &signal.strategy_name,
        );

        state.positions.insert(
            signal.symbol.clone(),
            OpenPosition {
                symbol: signal.symbol.clone(),
                side: signal.side,
                quantity: signal.quantity,
                entry_price: signal.price,
                current_price: signal.price,
                unrealized_pnl: Decimal::ZERO,
                opened_at: timestamp,
                trade_id: trade.id,
                strategy: signal.strategy_name.clone(),
            },
        );
        ledger.push(trade);
        state.revalue();
    }

    /// Exit when the price has crossed the percentage stop-loss or
    /// take-profit from entry, or when the owning strategy says so. A
    /// `should_exit` fault is logged and treated as "hold".
    fn exit_triggered(
        &self,
        position: &OpenPosition,
        step: &[MarketObservation],
        by_name: &HashMap<&str, &Arc<dyn Strategy>>,
    ) -> bool {
        let move_from_entry = position.return_from_entry();
        if self.stop_loss_pct > Decimal::ZERO && move_from_entry <= -self.stop_loss_pct {
            debug!(symbol = %position.symbol, %move_from_entry, "Stop-loss triggered");
            return true;
        }
        if self.take_profit_pct > Decimal::ZERO && move_from_entry >= self.take_profit_pct {
            debug!(symbol = %position.symbol, %move_from_entry, "Take-profit triggered");
            return true;
        }

        if let Some(strategy) = by_name.get(position.strategy.as_str()) {
            match strategy.should_exit(position, step) {
                Ok(exit) => return exit,
                Err(error) => {
                    warn!(
                        strategy = %position.strategy,
                        symbol = %position.symbol,
                        %error,
                        "Strategy exit check failed; holding position"
                    );
                }
            }
        }
        false
    }

    /// Close the open lot for `symbol` at `price`, credit cash, and finalize
    /// its ledger entry. Fees cover both legs.
    fn close_position(
        &self,
        symbol: &str,
        price: Decimal,
        timestamp: DateTime<Utc>,
        state: &mut PortfolioState,
        ledger: &mut Vec<CompletedTrade>,
    ) {
        let position = match state.positions.remove(symbol) {
            Some(p) => p,
            None => return,
        };

        let entry_value = position.quantity * position.entry_price;
        let exit_value = position.quantity * price;
        let exit_commission = exit_value * self.commission;
        let exit_slippage = exit_value * self.slippage;
        let entry_fees = entry_value * (self.commission + self.slippage);
        let fees = entry_fees + exit_commission + exit_slippage;

        let pnl = match position.side {
            Side::Long => exit_value - entry_value - fees,
            Side::Short => entry_value - exit_value - fees,
        };

        // Release the entry debit plus realized PnL; for longs this equals
        // exit proceeds net of exit-leg fees, and it keeps short round trips
        // consistent with the short PnL formula
        let entry_cost = entry_value * (Decimal::ONE + self.commission + self.slippage);
        state.cash += entry_cost + pnl;

        if let Some(trade) = ledger
            .iter_mut()
            .find(|t| t.id == position.trade_id && !t.is_closed())
        {
            trade.finalize(price, timestamp, pnl, exit_commission, exit_slippage);
        }
        state.revalue();
    }
}
