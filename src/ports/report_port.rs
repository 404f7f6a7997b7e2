//! Report output port trait.

use crate::domain::error::VpascanError;
use crate::domain::pipeline::{PipelineReport, SymbolSummary};

/// Port for persisting backtest artifacts.
pub trait ReportPort {
    /// Write the per-bar series (close, equity, anomaly flags) of one run.
    fn write_backtest(
        &self,
        report: &PipelineReport,
        output_path: &str,
    ) -> Result<(), VpascanError>;

    /// Write one summary row per symbol and mode of a universe run.
    fn write_summary(
        &self,
        rows: &[SymbolSummary],
        output_path: &str,
    ) -> Result<(), VpascanError>;
}
