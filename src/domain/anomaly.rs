//! Rolling-window volume price analysis classification.
//!
//! Each bar's spread and volume are compared against their distribution
//! over the `lookback` bars strictly before it. The current bar never
//! contributes to its own reference window, so flags exist only from index
//! `lookback` onwards; earlier bars carry no regime at all.

use std::fmt;

use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_LOOKBACK: usize = 20;

/// Bar direction from the candle body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

/// Where the bar sits relative to the trailing window percentiles.
///
/// `wide_spread` and `narrow_spread` cannot both hold, nor can
/// `low_volume` and `high_volume`; a value exactly at a percentile sets
/// neither flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegimeFlags {
    pub wide_spread: bool,
    pub narrow_spread: bool,
    pub low_volume: bool,
    pub high_volume: bool,
}

/// Volume price analysis anomaly categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// Up bar on wide spread but low volume: the move lacks participation.
    FakeUp,
    /// Down bar on wide spread but low volume.
    FakeDown,
    /// Up bar on narrow spread despite high volume: supply absorbs demand.
    AbsorbUp,
    /// Down bar on narrow spread despite high volume.
    AbsorbDown,
    /// Up bar on wide spread and high volume.
    ConfirmUp,
    /// Down bar on wide spread and high volume.
    ConfirmDown,
}

impl AnomalyKind {
    pub const ALL: [AnomalyKind; 6] = [
        AnomalyKind::FakeUp,
        AnomalyKind::FakeDown,
        AnomalyKind::AbsorbUp,
        AnomalyKind::AbsorbDown,
        AnomalyKind::ConfirmUp,
        AnomalyKind::ConfirmDown,
    ];
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnomalyKind::FakeUp => "FAKE UP (bearish)",
            AnomalyKind::FakeDown => "FAKE DOWN (bullish)",
            AnomalyKind::AbsorbUp => "ABSORB UP (bearish)",
            AnomalyKind::AbsorbDown => "ABSORB DOWN (bullish)",
            AnomalyKind::ConfirmUp => "CONFIRM UP (trend)",
            AnomalyKind::ConfirmDown => "CONFIRM DOWN (trend)",
        };
        write!(f, "{}", label)
    }
}

/// A bar plus everything the classifier derived from it.
#[derive(Debug, Clone)]
pub struct ClassifiedBar {
    pub bar: OhlcvBar,
    pub spread: f64,
    pub body: f64,
    pub direction: Direction,
    /// None while the trailing window is still filling.
    pub regime: Option<RegimeFlags>,
    pub anomaly: Option<AnomalyKind>,
    /// Bullish reversal reading: fake down or absorption down.
    pub signal_long: bool,
    /// Bearish reversal reading: fake up or absorption up.
    pub signal_short: bool,
}

/// Classify every bar against its trailing window.
///
/// The window for bar `i` is the half-open range `[i - lookback, i)`.
/// Threshold comparisons are strict, so a spread or volume exactly at the
/// 25th or 75th percentile reads as normal.
pub fn classify_bars(bars: &[OhlcvBar], lookback: usize) -> Vec<ClassifiedBar> {
    let spreads: Vec<f64> = bars.iter().map(|b| b.spread()).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let spread = spreads[i];
            let body = bar.body();
            let direction = if body > 0.0 {
                Direction::Up
            } else if body < 0.0 {
                Direction::Down
            } else {
                Direction::Flat
            };

            let regime = if lookback > 0 && i >= lookback {
                let spread_window = &spreads[i - lookback..i];
                let volume_window = &volumes[i - lookback..i];
                Some(RegimeFlags {
                    wide_spread: spread > quantile(spread_window, 0.75),
                    narrow_spread: spread < quantile(spread_window, 0.25),
                    low_volume: volumes[i] < quantile(volume_window, 0.25),
                    high_volume: volumes[i] > quantile(volume_window, 0.75),
                })
            } else {
                None
            };

            let anomaly = regime.and_then(|flags| derive_anomaly(direction, flags));
            let signal_long = matches!(
                anomaly,
                Some(AnomalyKind::FakeDown | AnomalyKind::AbsorbDown)
            );
            let signal_short = matches!(anomaly, Some(AnomalyKind::FakeUp | AnomalyKind::AbsorbUp));

            ClassifiedBar {
                bar: bar.clone(),
                spread,
                body,
                direction,
                regime,
                anomaly,
                signal_long,
                signal_short,
            }
        })
        .collect()
}

/// At most one category can match: the regime flag pairs are mutually
/// exclusive and each arm requires a distinct direction/flag combination.
fn derive_anomaly(direction: Direction, flags: RegimeFlags) -> Option<AnomalyKind> {
    match direction {
        Direction::Up if flags.wide_spread && flags.low_volume => Some(AnomalyKind::FakeUp),
        Direction::Up if flags.narrow_spread && flags.high_volume => Some(AnomalyKind::AbsorbUp),
        Direction::Up if flags.wide_spread && flags.high_volume => Some(AnomalyKind::ConfirmUp),
        Direction::Down if flags.wide_spread && flags.low_volume => Some(AnomalyKind::FakeDown),
        Direction::Down if flags.narrow_spread && flags.high_volume => Some(AnomalyKind::AbsorbDown),
        Direction::Down if flags.wide_spread && flags.high_volume => Some(AnomalyKind::ConfirmDown),
        _ => None,
    }
}

/// Linear-interpolation quantile over an unsorted sample.
///
/// `q` is in [0, 1]. The rank position is `q * (n - 1)`; fractional
/// positions interpolate between the two nearest order statistics. An
/// empty sample yields NaN, which no strict comparison matches.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = pos - lower as f64;
    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}
