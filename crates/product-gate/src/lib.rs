//! Deterministic quality gate for authored product records.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;
