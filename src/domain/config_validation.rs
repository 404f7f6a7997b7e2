//! Configuration validation.
//!
//! Validates all config fields before a run starts. Optional keys fall
//! back to their defaults; present keys must be in range.

use crate::domain::error::VpascanError;
use crate::domain::simulator::TradeMode;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), VpascanError> {
    validate_initial_equity(config)?;
    validate_cost_per_trade(config)?;
    validate_hold_bars(config)?;
    validate_mode(config)?;
    validate_dates(config)?;
    validate_symbols(config)?;
    Ok(())
}

pub fn validate_vpa_config(config: &dyn ConfigPort) -> Result<(), VpascanError> {
    validate_lookback(config)
}

fn validate_initial_equity(config: &dyn ConfigPort) -> Result<(), VpascanError> {
    let value = config.get_double("backtest", "initial_equity", 10_000.0);
    if value <= 0.0 {
        return Err(VpascanError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_equity".to_string(),
            reason: "initial_equity must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_cost_per_trade(config: &dyn ConfigPort) -> Result<(), VpascanError> {
    let value = config.get_double("backtest", "cost_per_trade", 0.001);
    if value < 0.0 {
        return Err(VpascanError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "cost_per_trade".to_string(),
            reason: "cost_per_trade must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_hold_bars(config: &dyn ConfigPort) -> Result<(), VpascanError> {
    let value = config.get_int("backtest", "hold_bars", 5);
    if value < 1 {
        return Err(VpascanError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "hold_bars".to_string(),
            reason: "hold_bars must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_mode(config: &dyn ConfigPort) -> Result<(), VpascanError> {
    match config.get_string("backtest", "mode") {
        Some(s) if TradeMode::parse(&s).is_none() => Err(VpascanError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "mode".to_string(),
            reason: "expected long_only, short_only or long_short".to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), VpascanError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(VpascanError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, VpascanError> {
    match value {
        None => Err(VpascanError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| VpascanError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            })
        }
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), VpascanError> {
    let symbols = config.get_string("backtest", "symbols");
    let symbol = config.get_string("backtest", "symbol");

    match (symbols, symbol) {
        (Some(s), _) if !s.trim().is_empty() => Ok(()),
        (None, Some(s)) if !s.trim().is_empty() => Ok(()),
        _ => Err(VpascanError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), VpascanError> {
    let value = config.get_int("vpa", "lookback", 20);
    if value < 1 {
        return Err(VpascanError::ConfigInvalid {
            section: "vpa".to_string(),
            key: "lookback".to_string(),
            reason: "lookback must be at least 1".to_string(),
        });
    }
    Ok(())
}
