//! Performance metrics for a completed run.

use crate::domain::anomaly::{AnomalyKind, ClassifiedBar};
use crate::domain::position::Trade;
use crate::domain::simulator::EquityPoint;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Per-category anomaly totals over a classified series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnomalyCounts {
    pub fake_up: usize,
    pub fake_down: usize,
    pub absorb_up: usize,
    pub absorb_down: usize,
    pub confirm_up: usize,
    pub confirm_down: usize,
}

impl AnomalyCounts {
    pub fn tally(series: &[ClassifiedBar]) -> Self {
        let mut counts = AnomalyCounts::default();
        for cb in series {
            match cb.anomaly {
                Some(AnomalyKind::FakeUp) => counts.fake_up += 1,
                Some(AnomalyKind::FakeDown) => counts.fake_down += 1,
                Some(AnomalyKind::AbsorbUp) => counts.absorb_up += 1,
                Some(AnomalyKind::AbsorbDown) => counts.absorb_down += 1,
                Some(AnomalyKind::ConfirmUp) => counts.confirm_up += 1,
                Some(AnomalyKind::ConfirmDown) => counts.confirm_down += 1,
                None => {}
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.fake_up
            + self.fake_down
            + self.absorb_up
            + self.absorb_down
            + self.confirm_up
            + self.confirm_down
    }

    pub fn get(&self, kind: AnomalyKind) -> usize {
        match kind {
            AnomalyKind::FakeUp => self.fake_up,
            AnomalyKind::FakeDown => self.fake_down,
            AnomalyKind::AbsorbUp => self.absorb_up,
            AnomalyKind::AbsorbDown => self.absorb_down,
            AnomalyKind::ConfirmUp => self.confirm_up,
            AnomalyKind::ConfirmDown => self.confirm_down,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub cagr: f64,
    pub volatility: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub buy_hold_return: f64,
    pub buy_hold_cagr: f64,
    pub anomalies: AnomalyCounts,
}

impl Metrics {
    /// Every ratio falls back to 0.0 rather than NaN on degenerate input
    /// (empty curve, zero variance, zero starting value), so rows always
    /// tabulate.
    pub fn compute(equity_curve: &[EquityPoint], trades: &[Trade], series: &[ClassifiedBar]) -> Self {
        let n_points = equity_curve.len();

        let total_return = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(last)) if first.equity > 0.0 => last.equity / first.equity - 1.0,
            _ => 0.0,
        };
        let cagr = annualize(total_return, n_points);

        let returns = per_bar_returns(equity_curve);
        let volatility = sample_stddev(&returns) * TRADING_DAYS_PER_YEAR.sqrt();
        let sharpe = if volatility > 0.0 { cagr / volatility } else { 0.0 };

        let buy_hold_return = match (series.first(), series.last()) {
            (Some(first), Some(last)) if first.bar.close > 0.0 => {
                last.bar.close / first.bar.close - 1.0
            }
            _ => 0.0,
        };
        let buy_hold_cagr = annualize(buy_hold_return, n_points);

        Metrics {
            total_return,
            cagr,
            volatility,
            sharpe,
            max_drawdown: compute_drawdown(equity_curve),
            total_trades: trades.len(),
            buy_hold_return,
            buy_hold_cagr,
            anomalies: AnomalyCounts::tally(series),
        }
    }
}

/// (1 + r)^(252 / n) - 1, or 0.0 with no points or a degenerate result.
/// A run that loses more than everything leaves 1 + r negative, and a
/// fractional power of a negative base has no real value.
fn annualize(total_return: f64, n_points: usize) -> f64 {
    if n_points == 0 || !total_return.is_finite() {
        return 0.0;
    }
    let grown = (1.0 + total_return).powf(TRADING_DAYS_PER_YEAR / n_points as f64);
    if grown.is_finite() { grown - 1.0 } else { 0.0 }
}

/// Per-bar equity returns, with a leading 0.0 for the seed point so the
/// vector has one entry per curve point.
fn per_bar_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    if equity_curve.is_empty() {
        return Vec::new();
    }
    let mut returns = Vec::with_capacity(equity_curve.len());
    returns.push(0.0);
    for pair in equity_curve.windows(2) {
        let prev = pair[0].equity;
        let curr = pair[1].equity;
        returns.push(if prev > 0.0 { curr / prev - 1.0 } else { 0.0 });
    }
    returns
}

/// Sample standard deviation (n - 1 divisor); 0.0 below two samples.
fn sample_stddev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    variance.sqrt()
}

/// Deepest equity excursion below the running peak, as a fraction <= 0.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_drawdown = 0.0_f64;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let drawdown = point.equity / peak - 1.0;
            if drawdown < max_drawdown {
                max_drawdown = drawdown;
            }
        }
    }
    max_drawdown
}
