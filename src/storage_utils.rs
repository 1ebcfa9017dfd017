use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

// CONFIGURATION STRUCTS
// Every field carries a serde default so a partial config file still loads.

pub const DEFAULT_SYMBOLS: &[&str] = &["BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT", "SUIUSDT"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct KlineConfig {
    pub limit: u32,       // e.g., 100 candles
    pub interval: String, // e.g., "1h", "4h", "1d"
}

impl Default for KlineConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            interval: "4h".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding both the side indicator file and the snapshot,
    /// relative to the working directory.
    pub dir: PathBuf,
    pub tech_file: String,   // without the ".json" extension
    pub output_file: String, // without the ".json" extension
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("apps/alpha-dashboard/src"),
            tech_file: "data_tech".to_string(),
            output_file: "data_integrated".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub symbols: Vec<String>,
    pub klines: KlineConfig,
    pub api: ApiConfig,
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            klines: KlineConfig::default(),
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file. An explicitly named file must exist.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read(path.as_ref()).await?;
        Ok(serde_json::from_slice(&content)?)
    }
}

// STORAGE MANAGER

pub struct AsyncStorageManager {
    pub base_dir: PathBuf,
}

impl AsyncStorageManager {
    /// Creates a manager rooted at `base_dir`, creating the directory up front
    /// so later saves never have to check for it.
    pub async fn new<P: AsRef<Path>>(base_dir: P) -> crate::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir).await?;
        }
        Ok(Self { base_dir })
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", filename))
    }

    /// **Generic Save Function**
    /// Serializes `data` as pretty JSON and replaces `filename.json`.
    /// Writes to a `.tmp` sibling first and renames it over the target, so an
    /// interrupted run leaves the previous snapshot in place.
    pub async fn save<T: Serialize>(&self, filename: &str, data: &T) -> crate::Result<PathBuf> {
        let final_path = self.path_for(filename);
        let tmp_path = self.base_dir.join(format!("{}.json.tmp", filename));

        let json_bytes = serde_json::to_vec_pretty(data)?;

        fs::write(&tmp_path, json_bytes).await?;
        fs::rename(&tmp_path, &final_path).await?;

        debug!(path = %final_path.display(), "snapshot written");
        Ok(final_path)
    }

    /// **Generic Load Function**
    /// Reads `filename.json` and deserializes it into `T`.
    pub async fn load<T: DeserializeOwned>(&self, filename: &str) -> crate::Result<T> {
        // Read bytes rather than a String; serde_json validates UTF-8 itself.
        let content = fs::read(self.path_for(filename)).await?;
        Ok(serde_json::from_slice(&content)?)
    }

    /// Like [`load`](Self::load) but a missing file yields `Ok(None)`.
    /// A file that exists but does not parse is still an error.
    pub async fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> crate::Result<Option<T>> {
        match fs::read(self.path_for(filename)).await {
            Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
