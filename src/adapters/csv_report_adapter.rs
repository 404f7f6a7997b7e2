//! CSV report adapter.
//!
//! Writes the two analysis artifacts: the per-bar backtest series and the
//! universe summary table. Return-like fields are written as percent
//! values rounded to two decimals, ready for spreadsheet use.

use crate::domain::anomaly::AnomalyKind;
use crate::domain::error::VpascanError;
use crate::domain::pipeline::{PipelineReport, SymbolSummary};
use crate::ports::report_port::ReportPort;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct BacktestRow<'a> {
    date: String,
    symbol: &'a str,
    close: f64,
    volume: i64,
    equity: f64,
    fake_up: bool,
    fake_down: bool,
    absorb_up: bool,
    absorb_down: bool,
    confirm_up: bool,
    confirm_down: bool,
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    symbol: String,
    mode: String,
    trades: usize,
    total_return_pct: f64,
    cagr_pct: f64,
    sharpe: f64,
    max_drawdown_pct: f64,
    buy_hold_return_pct: f64,
    buy_hold_cagr_pct: f64,
}

#[derive(Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

/// Fraction to percent, rounded to two decimals.
fn pct(value: f64) -> f64 {
    (value * 10_000.0).round() / 100.0
}

fn write_error(path: &str, e: impl std::fmt::Display) -> VpascanError {
    VpascanError::ReportWrite {
        path: path.to_string(),
        reason: e.to_string(),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_backtest(
        &self,
        report: &PipelineReport,
        output_path: &str,
    ) -> Result<(), VpascanError> {
        let mut writer =
            csv::Writer::from_path(output_path).map_err(|e| write_error(output_path, e))?;

        for (cb, point) in report.classified.iter().zip(&report.equity_curve) {
            let row = BacktestRow {
                date: cb.bar.date.to_string(),
                symbol: &report.symbol,
                close: cb.bar.close,
                volume: cb.bar.volume,
                equity: point.equity,
                fake_up: cb.anomaly == Some(AnomalyKind::FakeUp),
                fake_down: cb.anomaly == Some(AnomalyKind::FakeDown),
                absorb_up: cb.anomaly == Some(AnomalyKind::AbsorbUp),
                absorb_down: cb.anomaly == Some(AnomalyKind::AbsorbDown),
                confirm_up: cb.anomaly == Some(AnomalyKind::ConfirmUp),
                confirm_down: cb.anomaly == Some(AnomalyKind::ConfirmDown),
            };
            writer.serialize(row).map_err(|e| write_error(output_path, e))?;
        }

        writer.flush().map_err(|e| write_error(output_path, e))?;
        Ok(())
    }

    fn write_summary(&self, rows: &[SymbolSummary], output_path: &str) -> Result<(), VpascanError> {
        let mut writer =
            csv::Writer::from_path(output_path).map_err(|e| write_error(output_path, e))?;

        for summary in rows {
            let row = SummaryRow {
                symbol: summary.symbol.clone(),
                mode: summary.mode.label().to_string(),
                trades: summary.trades,
                total_return_pct: pct(summary.total_return),
                cagr_pct: pct(summary.cagr),
                sharpe: (summary.sharpe * 100.0).round() / 100.0,
                max_drawdown_pct: pct(summary.max_drawdown),
                buy_hold_return_pct: pct(summary.buy_hold_return),
                buy_hold_cagr_pct: pct(summary.buy_hold_cagr),
            };
            writer.serialize(row).map_err(|e| write_error(output_path, e))?;
        }

        writer.flush().map_err(|e| write_error(output_path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pipeline::{run_pipeline, PipelineConfig};
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::simulator::TradeMode;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    fn flat_bars(count: usize) -> Vec<OhlcvBar> {
        (0..count)
            .map(|i| OhlcvBar {
                symbol: "SPY".into(),
                date: day(i),
                open: 100.0,
                high: 100.0,
                low: 100.0,
                close: 100.0,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn backtest_csv_has_row_per_bar() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backtest.csv");
        let report = run_pipeline("SPY", &flat_bars(5), &PipelineConfig::default()).unwrap();

        CsvReportAdapter::new()
            .write_backtest(&report, &path.to_string_lossy())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("date"));
        assert!(header.contains("equity"));
        assert!(header.contains("fake_up"));
        assert!(header.contains("confirm_down"));
        assert_eq!(lines.count(), 5);
    }

    #[test]
    fn backtest_rows_carry_equity_and_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backtest.csv");
        let report = run_pipeline("SPY", &flat_bars(3), &PipelineConfig::default()).unwrap();

        CsvReportAdapter::new()
            .write_backtest(&report, &path.to_string_lossy())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let first_row = content.lines().nth(1).unwrap();
        assert!(first_row.starts_with("2024-01-01,SPY,100.0,1000,10000"));
        assert!(first_row.contains("false"));
    }

    #[test]
    fn summary_scales_returns_to_percent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.csv");
        let rows = vec![SymbolSummary {
            symbol: "SPY".into(),
            mode: TradeMode::LongShort,
            trades: 7,
            total_return: 0.123_456,
            cagr: 0.05,
            sharpe: 1.234_9,
            max_drawdown: -0.201_23,
            buy_hold_return: 0.3,
            buy_hold_cagr: 0.15,
        }];

        CsvReportAdapter::new()
            .write_summary(&rows, &path.to_string_lossy())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("total_return_pct"));
        assert!(header.contains("mode"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("SPY,long_short,7,12.35,5.0,1.23,-20.12,30.0,15.0"));
    }

    #[test]
    fn unwritable_path_is_report_write_error() {
        let report = run_pipeline("SPY", &flat_bars(3), &PipelineConfig::default()).unwrap();
        let err = CsvReportAdapter::new()
            .write_backtest(&report, "/nonexistent/dir/report.csv")
            .unwrap_err();
        assert!(matches!(err, VpascanError::ReportWrite { .. }));
    }
}
