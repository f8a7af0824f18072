//! gridcalc_engine - Spreadsheet formula engine.

pub mod builtins;
pub mod engine;
