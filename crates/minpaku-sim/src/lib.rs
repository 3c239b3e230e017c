//! Minpaku (short-term rental) investment projection service.

pub mod config;
pub mod error;
pub mod simulation;
pub mod telemetry;
