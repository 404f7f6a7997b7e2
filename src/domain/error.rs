//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for vpascan.
#[derive(Debug, thiserror::Error)]
pub enum VpascanError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid bar for {symbol} on {date}: {reason}")]
    InvalidBar {
        symbol: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("bars for {symbol} out of order at {date}: dates must be strictly increasing")]
    OutOfOrderBar { symbol: String, date: NaiveDate },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("failed to write report {path}: {reason}")]
    ReportWrite { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&VpascanError> for std::process::ExitCode {
    fn from(err: &VpascanError) -> Self {
        let code: u8 = match err {
            VpascanError::Io(_) | VpascanError::ReportWrite { .. } => 1,
            VpascanError::ConfigParse { .. }
            | VpascanError::ConfigMissing { .. }
            | VpascanError::ConfigInvalid { .. } => 2,
            VpascanError::DataSource { .. } => 3,
            VpascanError::InvalidBar { .. } | VpascanError::OutOfOrderBar { .. } => 4,
            VpascanError::NoData { .. } | VpascanError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
