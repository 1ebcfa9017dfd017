use crate::error::{Result, ScreenerError};
use crate::storage_utils::{ApiConfig, KlineConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserializer;
use serde::de::{self, Visitor};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

const KLINES_PATH: &str = "/api/v3/klines";

// Positions inside one Binance kline row.
const HIGH_IDX: usize = 2;
const LOW_IDX: usize = 3;
const CLOSE_IDX: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Highs, lows and closes as index-aligned sequences, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
}

impl CandleSeries {
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            highs: candles.iter().map(|c| c.high).collect(),
            lows: candles.iter().map(|c| c.low).collect(),
            closes: candles.iter().map(|c| c.close).collect(),
        }
    }

    pub fn last_close(&self) -> Option<f64> {
        self.closes.last().copied()
    }
}

/// Anything that can hand back the most recent candles for a symbol.
#[async_trait]
pub trait CandleSource {
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: u32) -> Result<Vec<Candle>>;
}

/// Spot klines endpoint client.
pub struct BinanceKlines {
    client: Client,
    base_url: String,
}

impl BinanceKlines {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, &api.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CandleSource for BinanceKlines {
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: u32) -> Result<Vec<Candle>> {
        let url = format!("{}{}", self.base_url, KLINES_PATH);
        let query = [
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ScreenerError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let candles = decode_klines(&body)?;
        debug!(symbol, count = candles.len(), "klines fetched");
        Ok(candles)
    }
}

/// Convenience wrapper taking the kline section of the config.
pub async fn fetch_series<S: CandleSource + ?Sized>(
    source: &S,
    symbol: &str,
    cfg: &KlineConfig,
) -> Result<CandleSeries> {
    let candles = source.fetch_candles(symbol, &cfg.interval, cfg.limit).await?;
    Ok(CandleSeries::from_candles(&candles))
}

/// Parses a klines response body: a JSON array of arrays where positions
/// 2, 3 and 4 carry high, low and close as strings or numbers.
pub fn decode_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<Vec<Value>> =
        serde_json::from_str(body).map_err(|e| ScreenerError::Decode(e.to_string()))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(Candle {
                high: price_at(row, HIGH_IDX, i)?,
                low: price_at(row, LOW_IDX, i)?,
                close: price_at(row, CLOSE_IDX, i)?,
            })
        })
        .collect()
}

fn price_at(row: &[Value], idx: usize, row_no: usize) -> Result<f64> {
    let value = row
        .get(idx)
        .ok_or_else(|| ScreenerError::Decode(format!("row {}: missing field {}", row_no, idx)))?;
    value
        .deserialize_any(LenientF64Visitor)
        .map_err(|e| ScreenerError::Decode(format!("row {}: field {}: {}", row_no, idx, e)))
}

struct LenientF64Visitor;

impl<'de> Visitor<'de> for LenientF64Visitor {
    type Value = f64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a float, an integer, or a string representing a number")
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E> {
        Ok(v as f64)
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E> {
        Ok(v as f64)
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.trim().parse::<f64>().map_err(E::custom)
    }
}
