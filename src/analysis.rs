//! This module contains the core analysis pipeline logic.

use crate::error::{Result, ScreenerError};
use crate::indicators::{TechIndicators, TechRecord};
use crate::klines::{self, CandleSeries, CandleSource};
use crate::ote::{self, OteZone, SetupDirection};
use crate::storage_utils::{AppConfig, AsyncStorageManager};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::path::PathBuf;
use tracing::{info, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub symbol: String,
    pub price: f64,
    pub setup_type: SetupDirection,
    pub ote_zone: OteZone,
    pub recommended_entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub score: u32,
    pub adx: f64,
    pub rsi: f64,
    pub status: String,
    pub is_123_rule: bool,
    pub last_update: String,
}

/// Symbol → result, kept in the order symbols were processed.
/// Serializes as a single JSON object.
#[derive(Debug, Clone, Default)]
pub struct ResultsMapping {
    entries: Vec<AnalysisResult>,
}

impl ResultsMapping {
    pub fn insert(&mut self, result: AnalysisResult) {
        match self.entries.iter_mut().find(|r| r.symbol == result.symbol) {
            Some(existing) => *existing = result,
            None => self.entries.push(result),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&AnalysisResult> {
        self.entries.iter().find(|r| r.symbol == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ResultsMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.symbol, entry)?;
        }
        map.end()
    }
}

#[derive(Debug)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct RunSummary {
    pub results: ResultsMapping,
    pub skipped: Vec<SkippedSymbol>,
    pub output_path: PathBuf,
    pub started_at: String,
}

impl RunSummary {
    /// True when there was something to process and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        self.results.is_empty() && !self.skipped.is_empty()
    }
}

/// Two-decimal rounding on the exact binary value, ties to even.
fn round2(v: f64) -> f64 {
    format!("{:.2}", v).parse().unwrap_or(v)
}

pub fn timestamp_now() -> String {
    chrono::Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
}

/// Swing, zone, confirmation and score for one symbol's window, merged with
/// its technical record.
pub fn analyze_series(
    symbol: &str,
    series: &CandleSeries,
    tech: TechRecord,
    last_update: String,
) -> Result<AnalysisResult> {
    let current_price = series.last_close().ok_or(ScreenerError::EmptyWindow)?;
    let swings = ote::find_swings(&series.highs, &series.lows).ok_or(ScreenerError::EmptyWindow)?;
    let setup = ote::build_setup(&swings);

    let confirmed = ote::is_123_valid(current_price, setup.direction, &series.highs, &series.lows, &swings);
    let ma20 = ote::moving_average(&series.closes);
    let score = ote::composite_score(current_price, setup.zone.mid, setup.direction, ma20, confirmed);

    Ok(AnalysisResult {
        symbol: symbol.to_string(),
        price: current_price,
        setup_type: setup.direction,
        ote_zone: setup.zone,
        recommended_entry: round2(setup.zone.mid),
        take_profit: round2(setup.target),
        stop_loss: round2(setup.stop),
        score,
        adx: tech.adx,
        rsi: tech.rsi,
        status: tech.status,
        is_123_rule: confirmed,
        last_update,
    })
}

async fn analyze_symbol<S: CandleSource + ?Sized>(
    source: &S,
    config: &AppConfig,
    tech: &TechIndicators,
    symbol: &str,
) -> Result<AnalysisResult> {
    let series = klines::fetch_series(source, symbol, &config.klines).await?;
    analyze_series(symbol, &series, tech.lookup(symbol), timestamp_now())
}

/// Runs the full analysis pipeline:
/// 1. Loads the side technical indicators once.
/// 2. Fetches and analyses each configured symbol in order, skipping the ones that fail.
/// 3. Writes every successful result as one snapshot, replacing the previous one.
pub async fn run_analysis_pipeline<S: CandleSource + ?Sized>(
    config: &AppConfig,
    source: &S,
) -> Result<RunSummary> {
    let started_at = timestamp_now();
    info!(
        symbols = config.symbols.len(),
        interval = %config.klines.interval,
        limit = config.klines.limit,
        "starting integrated OTE analysis"
    );

    let storage = AsyncStorageManager::new(&config.storage.dir).await?;
    let tech = TechIndicators::load(&storage, &config.storage.tech_file).await;

    let mut results = ResultsMapping::default();
    let mut skipped = Vec::new();

    for symbol in &config.symbols {
        match analyze_symbol(source, config, &tech, symbol).await {
            Ok(result) => {
                info!(symbol = %symbol, setup = %result.setup_type, score = result.score, "analysed");
                results.insert(result);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let output_path = storage.save(&config.storage.output_file, &results).await?;
    info!(path = %output_path.display(), written = results.len(), skipped = skipped.len(), "integrated analysis saved");

    Ok(RunSummary {
        results,
        skipped,
        output_path,
        started_at,
    })
}
