//! The classify, simulate, measure pipeline, run once per instrument.
//!
//! Single-symbol backtests, universe runs and the daily scanner all go
//! through [`run_pipeline`] so classification and trade timing can never
//! drift between entry points.

use chrono::NaiveDate;

use crate::domain::anomaly::{self, AnomalyKind, ClassifiedBar};
use crate::domain::error::VpascanError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::{self, OhlcvBar};
use crate::domain::position::Trade;
use crate::domain::simulator::{self, EquityPoint, SimConfig, TradeMode};

/// Full parameter set for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub lookback: usize,
    pub hold_bars: usize,
    pub cost_per_trade: f64,
    pub initial_equity: f64,
    pub mode: TradeMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            lookback: anomaly::DEFAULT_LOOKBACK,
            hold_bars: 5,
            cost_per_trade: 0.001,
            initial_equity: 10_000.0,
            mode: TradeMode::LongOnly,
        }
    }
}

impl PipelineConfig {
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            hold_bars: self.hold_bars,
            cost_per_trade: self.cost_per_trade,
            initial_equity: self.initial_equity,
            mode: self.mode,
        }
    }

    pub fn with_mode(&self, mode: TradeMode) -> PipelineConfig {
        PipelineConfig {
            mode,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), VpascanError> {
        if self.lookback == 0 {
            return Err(VpascanError::ConfigInvalid {
                section: "vpa".to_string(),
                key: "lookback".to_string(),
                reason: "lookback must be at least 1".to_string(),
            });
        }
        self.sim_config().validate()
    }
}

/// Output of one instrument's pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub symbol: String,
    pub mode: TradeMode,
    pub classified: Vec<ClassifiedBar>,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub metrics: Metrics,
}

/// Validate, classify, simulate and measure one instrument's bar series.
///
/// A short history is not an error: with fewer than lookback + 1 bars the
/// classifier yields no flags and the simulator a flat curve with no
/// trades. Malformed bars and bad parameters fail before anything runs.
pub fn run_pipeline(
    symbol: &str,
    bars: &[OhlcvBar],
    config: &PipelineConfig,
) -> Result<PipelineReport, VpascanError> {
    config.validate()?;
    ohlcv::validate_series(bars)?;

    let classified = anomaly::classify_bars(bars, config.lookback);
    let result = simulator::simulate(&classified, &config.sim_config())?;
    let metrics = Metrics::compute(&result.equity_curve, &result.trades, &classified);

    Ok(PipelineReport {
        symbol: symbol.to_string(),
        mode: config.mode,
        classified,
        equity_curve: result.equity_curve,
        trades: result.trades,
        metrics,
    })
}

/// One row of a universe backtest summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSummary {
    pub symbol: String,
    pub mode: TradeMode,
    pub trades: usize,
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub buy_hold_return: f64,
    pub buy_hold_cagr: f64,
}

impl SymbolSummary {
    pub fn from_report(report: &PipelineReport) -> Self {
        let m = &report.metrics;
        SymbolSummary {
            symbol: report.symbol.clone(),
            mode: report.mode,
            trades: m.total_trades,
            total_return: m.total_return,
            cagr: m.cagr,
            sharpe: m.sharpe,
            max_drawdown: m.max_drawdown,
            buy_hold_return: m.buy_hold_return,
            buy_hold_cagr: m.buy_hold_cagr,
        }
    }
}

/// Latest-bar anomaly state for one watchlist symbol.
#[derive(Debug, Clone)]
pub struct ScanAlert {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    pub volume: i64,
    pub anomaly: AnomalyKind,
}

/// Inspect the last classified bar; None when the series is clean or too
/// short to classify.
pub fn scan_latest(classified: &[ClassifiedBar]) -> Option<ScanAlert> {
    let last = classified.last()?;
    let anomaly = last.anomaly?;
    Some(ScanAlert {
        symbol: last.bar.symbol.clone(),
        date: last.bar.date,
        close: last.bar.close,
        volume: last.bar.volume,
        anomaly,
    })
}
