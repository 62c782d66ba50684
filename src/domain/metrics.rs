//! Performance statistics over a simulated trade list.

use serde::Serialize;
use std::collections::BTreeMap;

use super::portfolio::SimulationLedger;
use super::position::TradeRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub starting_capital: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_percent: f64,
}

impl SimulationSummary {
    /// Replays `trades` in order from `starting_capital`. Win rate is in
    /// percent; loss figures are magnitudes.
    pub fn compute(starting_capital: f64, trades: &[TradeRecord]) -> Self {
        let mut ledger = SimulationLedger::new(starting_capital);
        for trade in trades {
            ledger.record_trade(trade.clone());
        }

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            let pnl = trade.return_amount;
            if pnl > 0.0 {
                winning_trades += 1;
                total_wins += pnl;
                if pnl > largest_win {
                    largest_win = pnl;
                }
            } else if pnl < 0.0 {
                losing_trades += 1;
                total_losses += pnl.abs();
                if pnl.abs() > largest_loss {
                    largest_loss = pnl.abs();
                }
            }
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let avg_win = if winning_trades > 0 {
            total_wins / winning_trades as f64
        } else {
            0.0
        };

        let avg_loss = if losing_trades > 0 {
            total_losses / losing_trades as f64
        } else {
            0.0
        };

        let total_return = ledger.total_return();
        let total_return_percent = if starting_capital > 0.0 {
            total_return / starting_capital * 100.0
        } else {
            0.0
        };

        SimulationSummary {
            starting_capital,
            final_capital: ledger.capital,
            total_return,
            total_return_percent,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            sharpe_ratio: compute_sharpe(trades),
            max_drawdown_percent: ledger.max_drawdown_percent,
        }
    }

    /// Same statistics scoped to each instrument, each replayed from the
    /// full starting capital.
    pub fn compute_per_instrument(
        starting_capital: f64,
        trades: &[TradeRecord],
    ) -> BTreeMap<String, SimulationSummary> {
        let mut grouped: BTreeMap<String, Vec<TradeRecord>> = BTreeMap::new();
        for trade in trades {
            grouped
                .entry(trade.instrument.clone())
                .or_default()
                .push(trade.clone());
        }
        grouped
            .into_iter()
            .map(|(instrument, trades)| {
                (instrument, SimulationSummary::compute(starting_capital, &trades))
            })
            .collect()
    }
}

/// mean(return%) / stddev(return%), population stddev. Zero without trades
/// or without dispersion.
fn compute_sharpe(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }

    let returns: Vec<f64> = trades.iter().map(|t| t.return_percent).collect();
    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 { mean / stddev } else { 0.0 }
}
