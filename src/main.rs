use anyhow::Context;
use clap::Parser;
use ote_screener::analysis;
use ote_screener::cli::Args;
use ote_screener::klines::BinanceKlines;
use ote_screener::storage_utils::AppConfig;
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // Step 1: Resolve configuration
    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .await
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    let config = args.apply(config);

    // Step 2: Fetch, analyse and persist
    let source = BinanceKlines::new(&config.api)?;
    let summary = analysis::run_analysis_pipeline(&config, &source)
        .await
        .context("analysis run failed")?;

    // Step 3: Display Results
    if !args.no_table {
        ote_screener::comfy_table::run(&summary);
    }

    if summary.all_failed() {
        error!("every configured symbol failed, snapshot is empty");
        return Ok(ExitCode::FAILURE);
    }
    if !summary.skipped.is_empty() {
        let names: Vec<&str> = summary.skipped.iter().map(|s| s.symbol.as_str()).collect();
        warn!(skipped = %names.join(","), "partial run");
    }

    Ok(ExitCode::SUCCESS)
}
