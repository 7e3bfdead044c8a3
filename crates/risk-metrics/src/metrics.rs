//! Performance and risk metric calculation.
//!
//! `compute_metrics` is a pure function from a trade ledger and an equity
//! curve to a `PerformanceMetrics` value. Hard contract: every ratio resolves
//! to exactly `0.0` when its denominator is zero, never `NaN` or infinity,
//! so degenerate inputs (zero trades, zero variance, single-point curves)
//! flow through downstream consumers without special-casing.

use backtest_core::types::{CompletedTrade, EquityPoint};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Annual risk-free rate used when the caller does not supply one.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.05;

/// Trading days per year, used to annualize daily volatility.
const TRADING_DAYS: f64 = 252.0;

/// Summary statistics derived from one replay run. Value object; never
/// mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Fractional return over the whole period.
    pub total_return: f64,
    /// Return compounded to a 365-day year.
    pub annualized_return: f64,
    /// Annualized standard deviation of daily returns.
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Largest peak-to-trough decline, as a fraction of the peak.
    pub max_drawdown: f64,
    pub calmar_ratio: f64,
    /// Value at Risk at 95% confidence (loss magnitude).
    pub var_95: f64,
    /// Value at Risk at 99% confidence.
    pub var_99: f64,
    /// Root mean square of the drawdown series.
    pub ulcer_index: f64,
    /// Total gains over total losses across trade PnLs.
    pub gain_to_pain_ratio: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    /// Average winning trade PnL.
    pub avg_win: f64,
    /// Average losing trade PnL (negative).
    pub avg_loss: f64,
    /// Expected PnL per trade.
    pub expectancy: f64,
    /// Longest run of strictly-positive-PnL trades, in ledger order.
    pub consecutive_wins: usize,
    /// Longest run of strictly-negative-PnL trades.
    pub consecutive_losses: usize,
    /// Final portfolio value.
    pub final_value: Decimal,
}

impl PerformanceMetrics {
    /// All-zero metrics, returned for degenerate inputs (empty equity curve,
    /// zero-trade windows).
    pub fn zeroed() -> Self {
        Self {
            total_return: 0.0,
            annualized_return: 0.0,
            volatility: 0.0,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            max_drawdown: 0.0,
            calmar_ratio: 0.0,
            var_95: 0.0,
            var_99: 0.0,
            ulcer_index: 0.0,
            gain_to_pain_ratio: 0.0,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            profit_factor: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            expectancy: 0.0,
            consecutive_wins: 0,
            consecutive_losses: 0,
            final_value: Decimal::ZERO,
        }
    }
}

/// Simple daily returns between consecutive equity points. A zero previous
/// value yields a 0.0 return rather than a division error.
pub fn daily_returns(equity: &[EquityPoint]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| {
            if w[0].value == Decimal::ZERO {
                0.0
            } else {
                ((w[1].value - w[0].value) / w[0].value)
                    .to_f64()
                    .unwrap_or(0.0)
            }
        })
        .collect()
}

/// Compute performance metrics from a trade ledger and equity curve.
///
/// `risk_free_rate` defaults to [`DEFAULT_RISK_FREE_RATE`] when `None`.
pub fn compute_metrics(
    trades: &[CompletedTrade],
    equity: &[EquityPoint],
    initial_capital: Decimal,
    risk_free_rate: Option<f64>,
) -> PerformanceMetrics {
    let risk_free_rate = risk_free_rate.unwrap_or(DEFAULT_RISK_FREE_RATE);

    let (first, last) = match (equity.first(), equity.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return PerformanceMetrics::zeroed(),
    };
    if initial_capital <= Decimal::ZERO {
        return PerformanceMetrics::zeroed();
    }

    let total_return = ((last.value - initial_capital) / initial_capital)
        .to_f64()
        .unwrap_or(0.0);

    let returns = daily_returns(equity);

    // Annualize over the elapsed calendar span
    let days = (last.timestamp - first.timestamp).num_seconds() as f64 / 86_400.0;
    let annualized_return = if days > 0.0 {
        (1.0 + total_return).powf(365.0 / days) - 1.0
    } else {
        total_return
    };

    let volatility = std_dev(&returns) * TRADING_DAYS.sqrt();

    let sharpe_ratio = if volatility > 0.0 {
        (annualized_return - risk_free_rate) / volatility
    } else {
        0.0
    };

    // Downside deviation: dispersion of only the below-mean returns
    let mean = mean(&returns);
    let downside: Vec<f64> = returns
        .iter()
        .filter(|&&r| r < mean)
        .map(|&r| (r - mean).powi(2))
        .collect();
    let downside_dev = if downside.is_empty() {
        0.0
    } else {
        (downside.iter().sum::<f64>() / downside.len() as f64).sqrt() * TRADING_DAYS.sqrt()
    };
    let sortino_ratio = if downside_dev > 0.0 {
        (annualized_return - risk_free_rate) / downside_dev
    } else {
        0.0
    };

    let drawdowns = drawdown_series(equity);
    let max_drawdown = drawdowns.iter().cloned().fold(0.0_f64, f64::max);
    let calmar_ratio = if max_drawdown > 0.0 {
        annualized_return / max_drawdown
    } else {
        0.0
    };

    let ulcer_index = if drawdowns.is_empty() {
        0.0
    } else {
        (drawdowns.iter().map(|d| d * d).sum::<f64>() / drawdowns.len() as f64).sqrt()
    };

    let (var_95, var_99) = value_at_risk(&returns);

    let trade_stats = TradeStats::from_trades(trades);

    PerformanceMetrics {
        total_return,
        annualized_return,
        volatility,
        sharpe_ratio,
        sortino_ratio,
        max_drawdown,
        calmar_ratio,
        var_95,
        var_99,
        ulcer_index,
        gain_to_pain_ratio: trade_stats.gain_to_pain,
        total_trades: trade_stats.total,
        winning_trades: trade_stats.winners,
        losing_trades: trade_stats.losers,
        win_rate: trade_stats.win_rate,
        profit_factor: trade_stats.profit_factor,
        avg_win: trade_stats.avg_win,
        avg_loss: trade_stats.avg_loss,
        expectancy: trade_stats.expectancy,
        consecutive_wins: trade_stats.consecutive_wins,
        consecutive_losses: trade_stats.consecutive_losses,
        final_value: last.value,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Drawdown at each equity point using the running-peak method.
fn drawdown_series(equity: &[EquityPoint]) -> Vec<f64> {
    let mut peak = Decimal::ZERO;
    equity
        .iter()
        .map(|point| {
            if point.value > peak {
                peak = point.value;
            }
            if peak > Decimal::ZERO {
                ((peak - point.value) / peak).to_f64().unwrap_or(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// VaR at 95%/99%: absolute value of the return at the tail quantile of the
/// sorted daily-return series.
fn value_at_risk(returns: &[f64]) -> (f64, f64) {
    if returns.is_empty() {
        return (0.0, 0.0);
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let at = |confidence: f64| -> f64 {
        let idx = (((1.0 - confidence) * sorted.len() as f64).floor() as usize)
            .min(sorted.len() - 1);
        sorted[idx].abs()
    };
    (at(0.95), at(0.99))
}

struct TradeStats {
    total: usize,
    winners: usize,
    losers: usize,
    win_rate: f64,
    profit_factor: f64,
    gain_to_pain: f64,
    avg_win: f64,
    avg_loss: f64,
    expectancy: f64,
    consecutive_wins: usize,
    consecutive_losses: usize,
}

impl TradeStats {
    fn from_trades(trades: &[CompletedTrade]) -> Self {
        let pnls: Vec<f64> = trades
            .iter()
            .filter_map(|t| t.pnl)
            .map(|p| p.to_f64().unwrap_or(0.0))
            .collect();

        let total = pnls.len();
        let wins: Vec<f64> = pnls.iter().filter(|&&p| p > 0.0).copied().collect();
        let losses: Vec<f64> = pnls.iter().filter(|&&p| p < 0.0).copied().collect();
        let winners = wins.len();
        let losers = losses.len();

        let win_rate = if total > 0 {
            winners as f64 / total as f64
        } else {
            0.0
        };

        let total_gains: f64 = wins.iter().sum();
        let total_losses: f64 = losses.iter().map(|l| l.abs()).sum();

        let profit_factor = if losers > 0 && total_losses > 0.0 {
            total_gains / total_losses
        } else {
            0.0
        };
        let gain_to_pain = if total_losses > 0.0 {
            total_gains / total_losses
        } else {
            0.0
        };

        let avg_win = if winners > 0 {
            total_gains / winners as f64
        } else {
            0.0
        };
        let avg_loss = if losers > 0 {
            losses.iter().sum::<f64>() / losers as f64
        } else {
            0.0
        };
        let expectancy = win_rate * avg_win + (1.0 - win_rate) * avg_loss;

        let mut consecutive_wins = 0usize;
        let mut consecutive_losses = 0usize;
        let mut run_wins = 0usize;
        let mut run_losses = 0usize;
        for pnl in &pnls {
            if *pnl > 0.0 {
                run_wins += 1;
                run_losses = 0;
                consecutive_wins = consecutive_wins.max(run_wins);
            } else if *pnl < 0.0 {
                run_losses += 1;
                run_wins = 0;
                consecutive_losses = consecutive_losses.max(run_losses);
            } else {
                run_wins = 0;
                run_losses = 0;
            }
        }

        Self {
            total,
            winners,
            losers,
            win_rate,
            profit_factor,
            gain_to_pain,
            avg_win,
            avg_loss,
            expectancy,
            consecutive_wins,
            consecutive_losses,
        }
    }
}
