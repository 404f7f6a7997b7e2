//! Data access port trait.

use crate::domain::error::VpascanError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Source of daily bars. Implementations return bars sorted by date; the
/// domain still re-checks the strict ordering before running.
pub trait DataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, VpascanError>;

    fn list_symbols(&self) -> Result<Vec<String>, VpascanError>;

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VpascanError>;
}
