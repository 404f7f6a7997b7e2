//! Core domain types and logic.

pub mod ohlcv;
pub mod anomaly;
pub mod position;
pub mod simulator;
pub mod metrics;
pub mod pipeline;
pub mod universe;
pub mod config_validation;
pub mod error;
