//! Capital ledger threaded through one simulation run.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::position::TradeRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationLedger {
    pub starting_capital: f64,
    pub capital: f64,
    pub peak_capital: f64,
    pub max_drawdown_percent: f64,
    pub trades: Vec<TradeRecord>,
    /// Exit dates of positions taken per instrument.
    holdings: HashMap<String, Vec<NaiveDate>>,
}

impl SimulationLedger {
    pub fn new(starting_capital: f64) -> Self {
        SimulationLedger {
            starting_capital,
            capital: starting_capital,
            peak_capital: starting_capital,
            max_drawdown_percent: 0.0,
            trades: Vec::new(),
            holdings: HashMap::new(),
        }
    }

    pub fn can_afford(&self, position_size: f64) -> bool {
        self.capital >= position_size
    }

    /// Positions on `instrument` still held when entering on `entry_date`.
    pub fn open_positions(&self, instrument: &str, entry_date: NaiveDate) -> usize {
        self.holdings
            .get(instrument)
            .map_or(0, |exits| exits.iter().filter(|&&exit| exit > entry_date).count())
    }

    /// Applies a completed trade and updates the running peak and drawdown.
    pub fn record_trade(&mut self, trade: TradeRecord) {
        self.capital += trade.return_amount;
        if self.capital > self.peak_capital {
            self.peak_capital = self.capital;
        } else if self.peak_capital > 0.0 {
            let dd = (self.peak_capital - self.capital) / self.peak_capital * 100.0;
            if dd > self.max_drawdown_percent {
                self.max_drawdown_percent = dd;
            }
        }
        self.holdings
            .entry(trade.instrument.clone())
            .or_default()
            .push(trade.target_date);
        self.trades.push(trade);
    }

    pub fn total_return(&self) -> f64 {
        self.capital - self.starting_capital
    }
}
