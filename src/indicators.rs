//! Externally computed ADX / RSI / status values.
//!
//! Another process keeps `data_tech.json` up to date; this module only reads
//! it. Anything missing (the file, a symbol, a single field) falls back to a
//! neutral value instead of failing.

use crate::storage_utils::AsyncStorageManager;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Status shown by the dashboard when nothing better is known ("wait and see").
pub const NEUTRAL_STATUS: &str = "觀望";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TechRecord {
    pub adx: f64,
    pub rsi: f64,
    pub status: String,
}

impl Default for TechRecord {
    fn default() -> Self {
        Self {
            adx: 0.0,
            rsi: 0.0,
            status: NEUTRAL_STATUS.to_string(),
        }
    }
}

/// Raw side-file records, decoded per symbol on lookup so one bad entry
/// only costs that symbol its values.
#[derive(Debug, Clone, Default)]
pub struct TechIndicators {
    records: HashMap<String, Value>,
}

impl TechIndicators {
    pub fn new(records: HashMap<String, Value>) -> Self {
        Self { records }
    }

    /// Reads the side file once. A missing file is an empty mapping; a file
    /// that is not a JSON object is logged and also treated as empty so that it
    /// never costs us the price analysis.
    pub async fn load(storage: &AsyncStorageManager, filename: &str) -> Self {
        match storage.load_optional::<HashMap<String, Value>>(filename).await {
            Ok(Some(records)) => {
                debug!(count = records.len(), "technical indicators loaded");
                Self::new(records)
            }
            Ok(None) => {
                debug!(file = filename, "no technical indicator file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(file = filename, error = %e, "ignoring unreadable technical indicator file");
                Self::default()
            }
        }
    }

    /// The symbol's record, or neutral defaults when it is absent or malformed.
    pub fn lookup(&self, symbol: &str) -> TechRecord {
        let Some(raw) = self.records.get(symbol) else {
            return TechRecord::default();
        };
        match serde_json::from_value(raw.clone()) {
            Ok(record) => record,
            Err(e) => {
                warn!(symbol, error = %e, "malformed technical record, using defaults");
                TechRecord::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
