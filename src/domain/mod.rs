//! Core domain types and logic.

pub mod accuracy;
pub mod calendar;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod pipeline;
pub mod portfolio;
pub mod position;
pub mod prediction;
pub mod series;
pub mod simulator;
pub mod strategy;
pub mod validator;
