//! Shared helpers for the pipeline tests.

use async_trait::async_trait;
use ote_screener::ScreenerError;
use ote_screener::klines::{Candle, CandleSource};
use ote_screener::storage_utils::AppConfig;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Serves canned candles per symbol; unknown symbols fail like a dead network.
#[derive(Default)]
pub struct FakeSource {
    pub candles: HashMap<String, Vec<Candle>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.candles.insert(symbol.to_string(), candles);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandleSource for FakeSource {
    async fn fetch_candles(&self, symbol: &str, _interval: &str, _limit: u32) -> ote_screener::Result<Vec<Candle>> {
        self.calls.lock().unwrap().push(symbol.to_string());
        match self.candles.get(symbol) {
            Some(c) => Ok(c.clone()),
            None => Err(ScreenerError::HttpStatus {
                status: 503,
                body: format!("{} unavailable", symbol),
            }),
        }
    }
}

/// The five-candle window used throughout the docs: LONG, swing 15 / 7.
pub fn sample_candles() -> Vec<Candle> {
    let highs = [10.0, 12.0, 9.0, 15.0, 11.0];
    let lows = [8.0, 9.0, 7.0, 10.0, 9.0];
    let closes = [9.0, 10.0, 8.0, 12.0, 10.0];
    highs
        .iter()
        .zip(lows.iter())
        .zip(closes.iter())
        .map(|((&high, &low), &close)| Candle { high, low, close })
        .collect()
}

pub fn config_for(dir: &Path, symbols: &[&str]) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.symbols = symbols.iter().map(|s| s.to_string()).collect();
    cfg.storage.dir = dir.to_path_buf();
    cfg
}
