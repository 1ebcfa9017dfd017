//! End-to-end runs of the analysis pipeline against a fake candle source.

mod common;

use common::{FakeSource, config_for, sample_candles};
use ote_screener::analysis::run_analysis_pipeline;
use ote_screener::indicators::NEUTRAL_STATUS;
use ote_screener::klines::Candle;
use serde_json::Value;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// In-memory log sink for asserting on emitted diagnostics.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

async fn read_snapshot(path: &std::path::Path) -> serde_json::Map<String, Value> {
    let bytes = tokio::fs::read(path).await.unwrap();
    match serde_json::from_slice(&bytes).unwrap() {
        Value::Object(map) => map,
        other => panic!("snapshot is not an object: {other}"),
    }
}

#[tokio::test]
async fn failed_symbol_is_skipped_and_others_still_written() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), &["BTCUSDT", "DEADUSDT", "ETHUSDT"]);
    let source = FakeSource::default()
        .with("BTCUSDT", sample_candles())
        .with("ETHUSDT", sample_candles());

    let summary = run_analysis_pipeline(&cfg, &source).await.unwrap();

    assert_eq!(source.calls(), vec!["BTCUSDT", "DEADUSDT", "ETHUSDT"]);
    assert_eq!(summary.results.len(), 2);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].symbol, "DEADUSDT");
    assert!(summary.skipped[0].reason.contains("503"));
    assert!(!summary.all_failed());

    let snapshot = read_snapshot(&summary.output_path).await;
    let keys: Vec<&String> = snapshot.keys().collect();
    assert_eq!(keys.len(), 2);
    assert!(snapshot.contains_key("BTCUSDT"));
    assert!(snapshot.contains_key("ETHUSDT"));
    assert!(!snapshot.contains_key("DEADUSDT"));
    assert_eq!(snapshot["BTCUSDT"]["symbol"], "BTCUSDT");
}

#[tokio::test]
async fn skipped_symbol_is_named_in_the_log() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), &["BTCUSDT", "DEADUSDT"]);
    let source = FakeSource::default().with("BTCUSDT", sample_candles());

    run_analysis_pipeline(&cfg, &source).await.unwrap();

    let out = logs.contents();
    let line = out
        .lines()
        .find(|l| l.contains("skipping symbol"))
        .unwrap_or_else(|| panic!("no skip diagnostic in:\n{out}"));
    assert!(line.contains("WARN"), "{line}");
    assert!(line.contains("DEADUSDT"), "{line}");
    assert!(line.contains("503"), "{line}");
    assert!(!out.lines().any(|l| l.contains("skipping symbol") && l.contains("BTCUSDT")));
}

#[tokio::test]
async fn one_bad_side_record_keeps_the_others() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(
        dir.path().join("data_tech.json"),
        r#"{"BTCUSDT": {"adx": 28.4, "rsi": 61.0, "status": "多頭"}, "ETHUSDT": {"adx": null, "rsi": 40}}"#,
    )
    .await
    .unwrap();
    let cfg = config_for(dir.path(), &["BTCUSDT", "ETHUSDT"]);
    let source = FakeSource::default()
        .with("BTCUSDT", sample_candles())
        .with("ETHUSDT", sample_candles());

    let summary = run_analysis_pipeline(&cfg, &source).await.unwrap();

    let btc = summary.results.get("BTCUSDT").unwrap();
    assert_eq!((btc.adx, btc.rsi, btc.status.as_str()), (28.4, 61.0, "多頭"));
    let eth = summary.results.get("ETHUSDT").unwrap();
    assert_eq!((eth.adx, eth.rsi, eth.status.as_str()), (0.0, 0.0, NEUTRAL_STATUS));
}

#[tokio::test]
async fn missing_side_file_fills_neutral_indicators() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), &["BTCUSDT"]);
    let source = FakeSource::default().with("BTCUSDT", sample_candles());

    let summary = run_analysis_pipeline(&cfg, &source).await.unwrap();
    let snapshot = read_snapshot(&summary.output_path).await;
    let btc = &snapshot["BTCUSDT"];

    assert_eq!(btc["adx"].as_f64(), Some(0.0));
    assert_eq!(btc["rsi"].as_f64(), Some(0.0));
    assert_eq!(btc["status"], NEUTRAL_STATUS);
    assert_eq!(btc["setup_type"], "LONG");
    assert_eq!(btc["recommended_entry"].as_f64(), Some(9.36));
    assert_eq!(btc["take_profit"].as_f64(), Some(15.0));
    assert_eq!(btc["stop_loss"].as_f64(), Some(7.0));
    assert_eq!(btc["score"].as_u64(), Some(60));
    assert_eq!(btc["is_123_rule"], false);
    assert_eq!(btc["ote_zone"]["fib_0"].as_f64(), Some(7.0));
    assert_eq!(btc["ote_zone"]["fib_1"].as_f64(), Some(15.0));
}

#[tokio::test]
async fn side_file_values_are_merged() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(
        dir.path().join("data_tech.json"),
        r#"{"BTCUSDT": {"adx": 28.4, "rsi": 61.0, "status": "多頭"}}"#,
    )
    .await
    .unwrap();
    let cfg = config_for(dir.path(), &["BTCUSDT", "ETHUSDT"]);
    let source = FakeSource::default()
        .with("BTCUSDT", sample_candles())
        .with("ETHUSDT", sample_candles());

    let summary = run_analysis_pipeline(&cfg, &source).await.unwrap();

    let btc = summary.results.get("BTCUSDT").unwrap();
    assert_eq!(btc.adx, 28.4);
    assert_eq!(btc.rsi, 61.0);
    assert_eq!(btc.status, "多頭");

    let eth = summary.results.get("ETHUSDT").unwrap();
    assert_eq!(eth.adx, 0.0);
    assert_eq!(eth.status, NEUTRAL_STATUS);
}

#[tokio::test]
async fn empty_window_skips_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), &["EMPTYUSDT", "BTCUSDT"]);
    let source = FakeSource::default()
        .with("EMPTYUSDT", Vec::new())
        .with("BTCUSDT", sample_candles());

    let summary = run_analysis_pipeline(&cfg, &source).await.unwrap();
    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.skipped[0].symbol, "EMPTYUSDT");
}

#[tokio::test]
async fn zero_midpoint_still_produces_a_record() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), &["ZEROUSDT"]);
    let flat = vec![Candle { high: 0.0, low: 0.0, close: 0.0 }; 3];
    let source = FakeSource::default().with("ZEROUSDT", flat);

    let summary = run_analysis_pipeline(&cfg, &source).await.unwrap();
    let rec = summary.results.get("ZEROUSDT").unwrap();
    assert_eq!(rec.ote_zone.mid, 0.0);
    // No proximity, trend or confirmation bonus.
    assert_eq!(rec.score, 50);
}

#[tokio::test]
async fn every_symbol_failing_still_overwrites_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("data_integrated.json"), r#"{"OLD": {}}"#)
        .await
        .unwrap();
    let cfg = config_for(dir.path(), &["AUSDT", "BUSDT"]);

    let summary = run_analysis_pipeline(&cfg, &FakeSource::default()).await.unwrap();

    assert!(summary.all_failed());
    let snapshot = read_snapshot(&summary.output_path).await;
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn reruns_differ_only_in_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), &["BTCUSDT", "ETHUSDT"]);
    let source = FakeSource::default()
        .with("BTCUSDT", sample_candles())
        .with("ETHUSDT", sample_candles());

    let first = run_analysis_pipeline(&cfg, &source).await.unwrap();
    let mut a = read_snapshot(&first.output_path).await;
    let second = run_analysis_pipeline(&cfg, &source).await.unwrap();
    let mut b = read_snapshot(&second.output_path).await;

    for map in [&mut a, &mut b] {
        for rec in map.values_mut() {
            rec.as_object_mut().unwrap().remove("last_update");
        }
    }
    assert_eq!(a, b);
}
