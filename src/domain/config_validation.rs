//! Configuration validation.
//!
//! Checks the `[simulation]`, `[validation]` and `[market]` sections before
//! any command runs. Absent keys fall back to defaults; present keys must
//! parse and be in range.

use crate::domain::calendar::MarketCalendar;
use crate::domain::error::ForecastError;
use crate::ports::config_port::ConfigPort;
use chrono::{FixedOffset, NaiveDate, NaiveTime, Weekday};

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), ForecastError> {
    validate_positive(config, "simulation", "starting_capital")?;
    validate_positive(config, "simulation", "position_size")?;
    validate_fee(config, "simulation", "fee_percent")?;
    validate_confidence(config, "simulation", "min_confidence")?;
    validate_max_positions(config)?;
    Ok(())
}

pub fn validate_scoring_config(config: &dyn ConfigPort) -> Result<(), ForecastError> {
    validate_confidence(config, "validation", "min_trade_confidence")?;
    validate_fee(config, "validation", "trade_fee_percent")?;
    Ok(())
}

pub fn validate_market_config(config: &dyn ConfigPort) -> Result<(), ForecastError> {
    if let Some(offset) = config.get_string("market", "utc_offset") {
        parse_utc_offset(&offset)?;
    }

    // A missing bound falls back to the default session.
    let defaults = MarketCalendar::default();
    let open = match config.get_string("market", "open") {
        Some(s) => parse_time(&s, "open")?,
        None => defaults.open_time,
    };
    let close = match config.get_string("market", "close") {
        Some(s) => parse_time(&s, "close")?,
        None => defaults.close_time,
    };
    if open >= close {
        return Err(invalid(
            "market",
            "open",
            &format!("open {} must be before close {}", open, close),
        ));
    }

    if config.get_string("market", "trading_days").is_some() {
        let days = config.get_list("market", "trading_days");
        if days.is_empty() {
            return Err(invalid(
                "market",
                "trading_days",
                "at least one trading day is required",
            ));
        }
        for day in &days {
            parse_weekday(day)?;
        }
    }

    for holiday in config.get_list("market", "holidays") {
        parse_holiday(&holiday)?;
    }
    Ok(())
}

/// Parses `+HH:MM` / `-HH:MM`, at most 14 hours from UTC.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, ForecastError> {
    let value = value.trim();
    let bad = || {
        invalid(
            "market",
            "utc_offset",
            &format!("invalid offset '{}', expected +HH:MM", value),
        )
    };

    let offset: FixedOffset = value.parse().map_err(|_| bad())?;
    if offset.local_minus_utc().abs() > 14 * 3600 {
        return Err(bad());
    }
    Ok(offset)
}

pub fn parse_time(value: &str, key: &str) -> Result<NaiveTime, ForecastError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        invalid(
            "market",
            key,
            &format!("invalid time '{}', expected HH:MM", value.trim()),
        )
    })
}

pub fn parse_weekday(value: &str) -> Result<Weekday, ForecastError> {
    value.trim().parse::<Weekday>().map_err(|_| {
        invalid(
            "market",
            "trading_days",
            &format!("unknown weekday '{}'", value.trim()),
        )
    })
}

pub fn parse_holiday(value: &str) -> Result<NaiveDate, ForecastError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            "market",
            "holidays",
            &format!("invalid holiday '{}', expected YYYY-MM-DD", value.trim()),
        )
    })
}

fn invalid(section: &str, key: &str, reason: &str) -> ForecastError {
    ForecastError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Present values must parse as numbers; the port silently defaults
/// unparseable ones.
fn check_numeric(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), ForecastError> {
    match config.get_string(section, key) {
        Some(s) if s.trim().parse::<f64>().is_err() => Err(invalid(
            section,
            key,
            &format!("{} must be a number", key),
        )),
        _ => Ok(()),
    }
}

fn validate_positive(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), ForecastError> {
    check_numeric(config, section, key)?;
    let value = config.get_double(section, key, 1.0);
    if value <= 0.0 {
        return Err(invalid(section, key, &format!("{} must be positive", key)));
    }
    Ok(())
}

fn validate_fee(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), ForecastError> {
    check_numeric(config, section, key)?;
    let value = config.get_double(section, key, 0.0);
    if !(0.0..100.0).contains(&value) {
        return Err(invalid(
            section,
            key,
            &format!("{} must be between 0 and 100", key),
        ));
    }
    Ok(())
}

fn validate_confidence(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), ForecastError> {
    check_numeric(config, section, key)?;
    let value = config.get_double(section, key, 0.5);
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(
            section,
            key,
            &format!("{} must be between 0 and 1", key),
        ));
    }
    Ok(())
}

fn validate_max_positions(config: &dyn ConfigPort) -> Result<(), ForecastError> {
    check_numeric(config, "simulation", "max_positions_per_instrument")?;
    let value = config.get_int("simulation", "max_positions_per_instrument", 1);
    if value < 1 {
        return Err(invalid(
            "simulation",
            "max_positions_per_instrument",
            "max_positions_per_instrument must be at least 1",
        ));
    }
    Ok(())
}
