//! Fetches recent klines for a handful of spot pairs, derives swing points,
//! an optimal-trade-entry zone, a simplified 123 confirmation and a composite
//! score, merges in externally computed ADX/RSI, and writes one JSON snapshot
//! for the dashboard.

pub mod analysis;
pub mod cli;
pub mod comfy_table;
pub mod error;
pub mod indicators;
pub mod klines;
pub mod ote;
pub mod storage_utils;

pub use error::{Result, ScreenerError};
