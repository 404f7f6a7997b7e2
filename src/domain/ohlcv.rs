//! OHLCV bar representation and structural validation.

use chrono::NaiveDate;

use crate::domain::error::VpascanError;

#[derive(Debug, Clone)]
pub struct OhlcvBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// |high - low|
    pub fn spread(&self) -> f64 {
        (self.high - self.low).abs()
    }

    /// close - open, signed
    pub fn body(&self) -> f64 {
        self.close - self.open
    }
}

/// Check the structural invariants of a bar series before any analysis
/// stage runs: finite non-negative fields, OHLC ordering, strictly
/// increasing dates.
pub fn validate_series(bars: &[OhlcvBar]) -> Result<(), VpascanError> {
    for bar in bars {
        validate_bar(bar)?;
    }
    for pair in bars.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(VpascanError::OutOfOrderBar {
                symbol: pair[1].symbol.clone(),
                date: pair[1].date,
            });
        }
    }
    Ok(())
}

fn validate_bar(bar: &OhlcvBar) -> Result<(), VpascanError> {
    if !(bar.open.is_finite() && bar.high.is_finite() && bar.low.is_finite() && bar.close.is_finite())
    {
        return Err(invalid(bar, "non-finite price field"));
    }
    if bar.open < 0.0 || bar.high < 0.0 || bar.low < 0.0 || bar.close < 0.0 {
        return Err(invalid(bar, "negative price field"));
    }
    if bar.volume < 0 {
        return Err(invalid(bar, "negative volume"));
    }
    if bar.high < bar.low {
        return Err(invalid(bar, "high below low"));
    }
    if bar.high < bar.open.max(bar.close) {
        return Err(invalid(bar, "high below open/close"));
    }
    if bar.low > bar.open.min(bar.close) {
        return Err(invalid(bar, "low above open/close"));
    }
    Ok(())
}

fn invalid(bar: &OhlcvBar, reason: &str) -> VpascanError {
    VpascanError::InvalidBar {
        symbol: bar.symbol.clone(),
        date: bar.date,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            symbol: "SPY".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn spread_is_high_minus_low() {
        let bar = sample_bar();
        // 110 - 90 = 20
        assert!((bar.spread() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn body_is_signed() {
        let bar = sample_bar();
        // 105 - 100 = 5
        assert!((bar.body() - 5.0).abs() < f64::EPSILON);

        let down = OhlcvBar {
            open: 105.0,
            close: 100.0,
            ..sample_bar()
        };
        assert!((down.body() + 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn valid_series_passes() {
        let mut second = sample_bar();
        second.date = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        assert!(validate_series(&[sample_bar(), second]).is_ok());
    }

    #[test]
    fn rejects_negative_price() {
        let bar = OhlcvBar {
            open: -1.0,
            ..sample_bar()
        };
        let err = validate_series(&[bar]).unwrap_err();
        assert!(matches!(
            err,
            VpascanError::InvalidBar { ref reason, .. } if reason == "negative price field"
        ));
    }

    #[test]
    fn rejects_negative_volume() {
        let bar = OhlcvBar {
            volume: -5,
            ..sample_bar()
        };
        let err = validate_series(&[bar]).unwrap_err();
        assert!(matches!(
            err,
            VpascanError::InvalidBar { ref reason, .. } if reason == "negative volume"
        ));
    }

    #[test]
    fn rejects_high_below_low() {
        let bar = OhlcvBar {
            high: 80.0,
            low: 90.0,
            open: 85.0,
            close: 85.0,
            ..sample_bar()
        };
        let err = validate_series(&[bar]).unwrap_err();
        assert!(matches!(
            err,
            VpascanError::InvalidBar { ref reason, .. } if reason == "high below low"
        ));
    }

    #[test]
    fn rejects_high_below_close() {
        let bar = OhlcvBar {
            high: 104.0,
            ..sample_bar()
        };
        let err = validate_series(&[bar]).unwrap_err();
        assert!(matches!(
            err,
            VpascanError::InvalidBar { ref reason, .. } if reason == "high below open/close"
        ));
    }

    #[test]
    fn rejects_low_above_open() {
        let bar = OhlcvBar {
            low: 101.0,
            high: 110.0,
            ..sample_bar()
        };
        let err = validate_series(&[bar]).unwrap_err();
        assert!(matches!(
            err,
            VpascanError::InvalidBar { ref reason, .. } if reason == "low above open/close"
        ));
    }

    #[test]
    fn rejects_nan_price() {
        let bar = OhlcvBar {
            close: f64::NAN,
            ..sample_bar()
        };
        let err = validate_series(&[bar]).unwrap_err();
        assert!(matches!(
            err,
            VpascanError::InvalidBar { ref reason, .. } if reason == "non-finite price field"
        ));
    }

    #[test]
    fn rejects_duplicate_date() {
        let err = validate_series(&[sample_bar(), sample_bar()]).unwrap_err();
        assert!(matches!(err, VpascanError::OutOfOrderBar { .. }));
    }

    #[test]
    fn rejects_backwards_date() {
        let mut earlier = sample_bar();
        earlier.date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let err = validate_series(&[sample_bar(), earlier]).unwrap_err();
        assert!(matches!(
            err,
            VpascanError::OutOfOrderBar { date, .. }
                if date == NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        ));
    }

    #[test]
    fn zero_prices_are_structurally_valid() {
        let bar = OhlcvBar {
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
            volume: 0,
            ..sample_bar()
        };
        assert!(validate_series(&[bar]).is_ok());
    }
}
