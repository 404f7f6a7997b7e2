//! Single-position backtest state machine.
//!
//! Walks a classified series strictly in time order. Signals act with a
//! one-bar lag, exits run before entries within a bar, and every exit
//! lands exactly `hold_bars` bars after its entry.

use std::fmt;

use chrono::NaiveDate;

use crate::domain::anomaly::ClassifiedBar;
use crate::domain::error::VpascanError;
use crate::domain::position::{OpenPosition, Trade, TradeDirection};

/// Which side of the signal pair may be acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeMode {
    LongOnly,
    ShortOnly,
    LongShort,
}

impl TradeMode {
    pub fn allows_long(self) -> bool {
        matches!(self, TradeMode::LongOnly | TradeMode::LongShort)
    }

    pub fn allows_short(self) -> bool {
        matches!(self, TradeMode::ShortOnly | TradeMode::LongShort)
    }

    /// Parse the configuration spelling.
    pub fn parse(value: &str) -> Option<TradeMode> {
        match value.to_lowercase().as_str() {
            "long_only" => Some(TradeMode::LongOnly),
            "short_only" => Some(TradeMode::ShortOnly),
            "long_short" => Some(TradeMode::LongShort),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TradeMode::LongOnly => "long_only",
            TradeMode::ShortOnly => "short_only",
            TradeMode::LongShort => "long_short",
        }
    }
}

impl fmt::Display for TradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub hold_bars: usize,
    /// Fractional cost charged once on entry and once on exit.
    pub cost_per_trade: f64,
    pub initial_equity: f64,
    pub mode: TradeMode,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            hold_bars: 5,
            cost_per_trade: 0.001,
            initial_equity: 10_000.0,
            mode: TradeMode::LongOnly,
        }
    }
}

impl SimConfig {
    /// Fail fast on parameter values a run could not be trusted with.
    pub fn validate(&self) -> Result<(), VpascanError> {
        if self.hold_bars == 0 {
            return Err(invalid_param("hold_bars", "hold_bars must be at least 1"));
        }
        if self.cost_per_trade < 0.0 {
            return Err(invalid_param(
                "cost_per_trade",
                "cost_per_trade must be non-negative",
            ));
        }
        if !(self.initial_equity > 0.0) {
            return Err(invalid_param(
                "initial_equity",
                "initial_equity must be positive",
            ));
        }
        Ok(())
    }
}

fn invalid_param(key: &str, reason: &str) -> VpascanError {
    VpascanError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// One point on the equity curve.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Simulator output: the equity curve (seed point included) and every
/// completed trade. A position still open at the end of the series is
/// not recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct SimResult {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
}

/// Run the state machine over a classified series.
///
/// Per bar i >= 1:
/// 1. bar return = close[i] / close[i-1] - 1
/// 2. holding: accrue direction sign times the bar return, bump bars_held
/// 3. exit once bars_held reaches hold_bars: charge cost, record the trade
/// 4. entry only when flat after the exit check, acting on bar i-1's
///    signal; longs win the tie under LongShort; charge cost
/// 5. equity[i] = equity[i-1] * (1 + pnl)
///
/// The curve has one point per bar, seeded at `initial_equity` on the
/// first bar's date before any trading.
pub fn simulate(series: &[ClassifiedBar], config: &SimConfig) -> Result<SimResult, VpascanError> {
    config.validate()?;
    ensure_chronological(series)?;

    if series.is_empty() {
        return Ok(SimResult {
            equity_curve: Vec::new(),
            trades: Vec::new(),
        });
    }

    let mut equity_curve = Vec::with_capacity(series.len());
    let mut trades = Vec::new();

    let mut equity = config.initial_equity;
    equity_curve.push(EquityPoint {
        date: series[0].bar.date,
        equity,
    });

    let mut position: Option<OpenPosition> = None;

    for i in 1..series.len() {
        let bar = &series[i];
        let prev = &series[i - 1];
        let bar_return = bar.bar.close / prev.bar.close - 1.0;
        let mut pnl = 0.0;

        if let Some(mut pos) = position.take() {
            pnl += pos.direction.sign() * bar_return;
            pos.bars_held += 1;

            if pos.bars_held >= config.hold_bars {
                pnl -= config.cost_per_trade;
                trades.push(Trade {
                    direction: pos.direction,
                    entry_date: pos.entry_date,
                    exit_date: bar.bar.date,
                    bars_held: pos.bars_held,
                });
            } else {
                position = Some(pos);
            }
        }

        if position.is_none() {
            if prev.signal_long && config.mode.allows_long() {
                position = Some(OpenPosition::new(TradeDirection::Long, bar.bar.date));
                pnl -= config.cost_per_trade;
            } else if prev.signal_short && config.mode.allows_short() {
                position = Some(OpenPosition::new(TradeDirection::Short, bar.bar.date));
                pnl -= config.cost_per_trade;
            }
        }

        equity *= 1.0 + pnl;
        equity_curve.push(EquityPoint {
            date: bar.bar.date,
            equity,
        });
    }

    Ok(SimResult {
        equity_curve,
        trades,
    })
}

fn ensure_chronological(series: &[ClassifiedBar]) -> Result<(), VpascanError> {
    for pair in series.windows(2) {
        if pair[1].bar.date <= pair[0].bar.date {
            return Err(VpascanError::OutOfOrderBar {
                symbol: pair[1].bar.symbol.clone(),
                date: pair[1].bar.date,
            });
        }
    }
    Ok(())
}
