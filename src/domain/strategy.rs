//! Trading strategy and simulation parameters.

use serde::Serialize;

pub const DEFAULT_STARTING_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_FEE_PERCENT: f64 = 0.2;

/// Which predictions the simulator acts on and how large each trade is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradingStrategy {
    pub min_confidence: f64,
    /// Currency amount committed per trade.
    pub position_size: f64,
    pub max_positions_per_instrument: usize,
}

impl Default for TradingStrategy {
    fn default() -> Self {
        TradingStrategy {
            min_confidence: 0.55,
            position_size: 10_000.0,
            max_positions_per_instrument: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationConfig {
    pub starting_capital: f64,
    /// Round-trip fee as a percentage of the position size.
    pub fee_percent: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            starting_capital: DEFAULT_STARTING_CAPITAL,
            fee_percent: DEFAULT_FEE_PERCENT,
        }
    }
}

impl SimulationConfig {
    pub fn fee_for(&self, position_size: f64) -> f64 {
        position_size * self.fee_percent / 100.0
    }
}
