//! CSV-directory data adapter.
//!
//! Serves bars from a directory of per-symbol files named `{SYMBOL}.csv`
//! with the header `date,open,high,low,close,volume`. Rows are sorted by
//! date after reading, so unsorted exports still load.

use crate::domain::error::VpascanError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CsvBarRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

#[derive(Debug)]
pub struct CsvDataAdapter {
    base_path: PathBuf,
}

impl CsvDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        CsvDataAdapter { base_path }
    }

    /// Build from the `[data] path` config key.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, VpascanError> {
        let path = config
            .get_string("data", "path")
            .ok_or_else(|| VpascanError::ConfigMissing {
                section: "data".to_string(),
                key: "path".to_string(),
            })?;
        Ok(CsvDataAdapter::new(PathBuf::from(path)))
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<OhlcvBar>, VpascanError> {
        let path = self.csv_path(symbol);
        let mut reader = csv::Reader::from_path(&path).map_err(|e| VpascanError::DataSource {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        let mut bars = Vec::new();
        for row in reader.deserialize() {
            let row: CsvBarRow = row.map_err(|e| VpascanError::DataSource {
                reason: format!("{}: {}", path.display(), e),
            })?;
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                VpascanError::DataSource {
                    reason: format!("{}: invalid date {:?}: {}", path.display(), row.date, e),
                }
            })?;
            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataPort for CsvDataAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, VpascanError> {
        let mut bars = self.read_all(symbol)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, VpascanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| VpascanError::DataSource {
            reason: format!("failed to read directory {}: {}", self.base_path.display(), e),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VpascanError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".csv") {
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VpascanError> {
        if !self.csv_path(symbol).exists() {
            return Ok(None);
        }
        let bars = self.read_all(symbol)?;
        if bars.is_empty() {
            return Ok(None);
        }
        Ok(Some((bars[0].date, bars[bars.len() - 1].date, bars.len())))
    }
}
