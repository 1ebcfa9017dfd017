use crate::storage_utils::AppConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about = "OTE / 123-rule screener for spot pairs", long_about = None)]
pub struct Args {
    /// JSON config file; built-in defaults are used when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Comma separated pairs, e.g. BTCUSDT,ETHUSDT
    #[arg(short, long, value_delimiter = ',')]
    pub symbols: Option<Vec<String>>,

    #[arg(short, long)]
    pub interval: Option<String>,

    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Directory holding data_tech.json and the snapshot output.
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    /// Do not print the summary table.
    #[arg(long)]
    pub no_table: bool,
}

impl Args {
    /// Command-line values win over whatever the config file said.
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(symbols) = &self.symbols {
            config.symbols = symbols
                .iter()
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(interval) = &self.interval {
            config.klines.interval = interval.clone();
        }
        if let Some(limit) = self.limit {
            config.klines.limit = limit;
        }
        if let Some(dir) = &self.storage_dir {
            config.storage.dir = dir.clone();
        }
        config
    }
}
