//! Position state and completed trades.

use std::fmt;

use chrono::NaiveDate;

/// Direction of an open position or completed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    /// Exposure sign applied to the bar return: +1 long, -1 short.
    pub fn sign(self) -> f64 {
        match self {
            TradeDirection::Long => 1.0,
            TradeDirection::Short => -1.0,
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "LONG"),
            TradeDirection::Short => write!(f, "SHORT"),
        }
    }
}

/// An open single-instrument position. Flat is the absence of one.
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub direction: TradeDirection,
    pub entry_date: NaiveDate,
    /// Completed bars since entry; the entry bar itself counts as zero.
    pub bars_held: usize,
}

impl OpenPosition {
    pub fn new(direction: TradeDirection, entry_date: NaiveDate) -> Self {
        OpenPosition {
            direction,
            entry_date,
            bars_held: 0,
        }
    }
}

/// One completed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub direction: TradeDirection,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub bars_held: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn sign_long_positive() {
        assert!((TradeDirection::Long.sign() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sign_short_negative() {
        assert!((TradeDirection::Short.sign() + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn display_labels() {
        assert_eq!(TradeDirection::Long.to_string(), "LONG");
        assert_eq!(TradeDirection::Short.to_string(), "SHORT");
    }

    #[test]
    fn new_position_starts_at_zero_bars() {
        let pos = OpenPosition::new(TradeDirection::Short, entry_date());
        assert_eq!(pos.direction, TradeDirection::Short);
        assert_eq!(pos.entry_date, entry_date());
        assert_eq!(pos.bars_held, 0);
    }

    #[test]
    fn trade_fields() {
        let trade = Trade {
            direction: TradeDirection::Long,
            entry_date: entry_date(),
            exit_date: NaiveDate::from_ymd_opt(2024, 1, 22).unwrap(),
            bars_held: 5,
        };
        assert_eq!(trade.direction, TradeDirection::Long);
        assert_eq!(trade.bars_held, 5);
        assert!(trade.exit_date > trade.entry_date);
    }
}
