#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use vpascan::domain::error::VpascanError;
pub use vpascan::domain::ohlcv::OhlcvBar;
use vpascan::domain::pipeline::PipelineConfig;
use vpascan::domain::simulator::TradeMode;
use vpascan::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, VpascanError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VpascanError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, VpascanError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VpascanError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VpascanError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Day `i` of the shared fixture calendar, starting 2024-01-01.
pub fn day(i: usize) -> NaiveDate {
    date(2024, 1, 1) + chrono::Duration::days(i as i64)
}

pub fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        lookback: 20,
        hold_bars: 5,
        cost_per_trade: 0.001,
        initial_equity: 10_000.0,
        mode: TradeMode::LongOnly,
    }
}

/// Identical bars: no spread or volume ever leaves the trailing band, so
/// nothing classifies and nothing trades.
pub fn flat_bars(symbol: &str, count: usize) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| OhlcvBar {
            symbol: symbol.to_string(),
            date: day(i),
            open: 100.0,
            high: 100.0,
            low: 100.0,
            close: 100.0,
            volume: 1_000,
        })
        .collect()
}

pub fn generate_bars(symbol: &str, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| OhlcvBar {
            symbol: symbol.to_string(),
            date: day(i),
            open: start_price + i as f64,
            high: start_price + i as f64 + 1.0,
            low: start_price + i as f64 - 1.0,
            close: start_price + i as f64,
            volume: 1_000,
        })
        .collect()
}

/// Bars cycling through spreads 2/3/4 and volumes 1000/1100/1200, with an
/// up bar at each `special` index on a 1.0 spread and 12000 volume. Every
/// trailing window's quartiles stay pinned at 2/4 and 1000/1200, so each
/// special bar reads absorption-up and nothing else classifies.
pub fn absorption_bars_at(symbol: &str, count: usize, specials: &[usize]) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let (spread, volume, up) = if specials.contains(&i) {
                (1.0, 12_000, true)
            } else {
                (2.0 + (i % 3) as f64, 1_000 + 100 * (i % 3) as i64, i % 2 == 0)
            };
            let open: f64 = 100.0;
            let close = if up { open + 0.5 } else { open - 0.5 };
            let low = open.min(close) - (spread - 0.5) / 2.0;
            OhlcvBar {
                symbol: symbol.to_string(),
                date: day(i),
                open,
                high: low + spread,
                low,
                close,
                volume,
            }
        })
        .collect()
}

pub fn absorption_bars(symbol: &str, count: usize) -> Vec<OhlcvBar> {
    absorption_bars_at(symbol, count, &[25])
}
