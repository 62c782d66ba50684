//! Simulated positions and the trade ledger entries they produce.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::domain::prediction::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Short,
}

impl From<Direction> for TradeSide {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => TradeSide::Buy,
            Direction::Down => TradeSide::Short,
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Short => write!(f, "SHORT"),
        }
    }
}

/// A round trip that lives only for one simulation step.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPosition {
    pub instrument: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub side: TradeSide,
    /// Currency amount committed.
    pub size: f64,
}

impl SimulatedPosition {
    pub fn shares(&self) -> f64 {
        self.size / self.entry_price
    }

    /// Gross P&L before fees. A wrong-way move comes out negative.
    pub fn gross_pnl(&self) -> f64 {
        match self.side {
            TradeSide::Buy => self.shares() * (self.exit_price - self.entry_price),
            TradeSide::Short => self.shares() * (self.entry_price - self.exit_price),
        }
    }

    pub fn net_pnl(&self, fee: f64) -> f64 {
        self.gross_pnl() - fee
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub prediction_id: i64,
    pub instrument: String,
    pub prediction_date: NaiveDate,
    pub target_date: NaiveDate,
    pub side: TradeSide,
    pub confidence: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub shares: f64,
    pub fee: f64,
    pub return_amount: f64,
    pub return_percent: f64,
    pub was_correct: bool,
    pub capital_after: f64,
}
