//! End-to-end batch runs against a temporary data directory.

use featlab_core::data::{FsRepository, OutputFormat, SymbolCatalog};
use featlab_core::domain::{expected_rows, min_history};
use featlab_core::features::FeaturePipeline;
use featlab_runner::{
    run_batch, save_report, BatchError, BatchOrchestrator, NoProgress, PipelineConfig,
    SymbolOutcome,
};
use std::fs;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../featlab-core/tests/fixtures")
        .join(name)
}

/// Synthetic raw CSV with `n` rows of rising closes.
fn write_series(raw: &Path, symbol: &str, n: usize) {
    let base = chrono::NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
    let mut text = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for i in 0..n {
        let date = base + chrono::Duration::days(i as i64);
        let close = 20.0 + i as f64 * 0.5;
        text.push_str(&format!(
            "{date},{:.2},{:.2},{:.2},{close:.2},{:.2},{}\n",
            close - 0.1,
            close + 0.4,
            close - 0.4,
            close * 0.97,
            10_000 + i
        ));
    }
    fs::write(raw.join(format!("{symbol}.csv")), text).unwrap();
}

/// Temp workspace: raw/A.csv, raw/C.csv, raw/BAD.csv, catalog listing A, B, C, BAD.
fn setup() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw");
    fs::create_dir_all(&raw).unwrap();
    write_series(&raw, "A", 25);
    write_series(&raw, "C", 40);
    fs::write(raw.join("BAD.csv"), "Date,Open,High,Low,Close,Volume\n2024-01-02,1,2,0.5,oops,10\n")
        .unwrap();
    fs::write(
        dir.path().join("tickers.csv"),
        "name,ticker\nAlpha,A\nBravo,B\nCharlie,C\nBroken,BAD\n",
    )
    .unwrap();
    dir
}

fn config_for(dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.catalog.path = dir.join("tickers.csv");
    config.data.raw_dir = dir.join("raw");
    config.data.output_dir = dir.join("out");
    config
}

#[test]
fn one_bad_symbol_does_not_stop_the_batch() {
    let dir = setup();
    let report = run_batch(&config_for(dir.path()), &NoProgress).unwrap();

    assert_eq!(report.total(), 4);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.exit_code(), 0);

    assert_eq!(report.outcome("A").unwrap().rows(), expected_rows(25, 3));
    assert_eq!(report.outcome("C").unwrap().rows(), expected_rows(40, 3));
    assert!(matches!(
        report.outcome("B"),
        Some(SymbolOutcome::Skipped { kind, .. }) if kind == "source_not_found"
    ));
    assert!(matches!(
        report.outcome("BAD"),
        Some(SymbolOutcome::Skipped { kind, .. }) if kind == "malformed_series"
    ));

    let out = dir.path().join("out");
    assert!(out.join("A_preprocessed.csv").exists());
    assert!(out.join("C_preprocessed.csv").exists());
    assert!(!out.join("B_preprocessed.csv").exists());
    assert!(!out.join("BAD_preprocessed.csv").exists());
}

#[test]
fn sequential_and_parallel_runs_write_the_same_files() {
    let dir = setup();
    let mut config = config_for(dir.path());

    config.batch.parallel = false;
    let seq = run_batch(&config, &NoProgress).unwrap();
    let seq_bytes = fs::read(dir.path().join("out/C_preprocessed.csv")).unwrap();

    config.batch.parallel = true;
    config.batch.threads = 3;
    let par = run_batch(&config, &NoProgress).unwrap();
    let par_bytes = fs::read(dir.path().join("out/C_preprocessed.csv")).unwrap();

    assert_eq!(seq.symbols, par.symbols);
    assert_eq!(seq_bytes, par_bytes);
}

#[test]
fn series_one_short_of_warmup_yields_header_only_output() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw");
    fs::create_dir_all(&raw).unwrap();
    write_series(&raw, "TINY", min_history(3) - 1);

    let repo = FsRepository::new(&raw, dir.path().join("out"));
    let orch = BatchOrchestrator::new(repo, FeaturePipeline::default());
    let report = orch
        .run(&SymbolCatalog::from_symbols(["TINY"]), &NoProgress)
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert!(report.outcome("TINY").unwrap().is_insufficient_history());

    let text = fs::read_to_string(dir.path().join("out/TINY_preprocessed.csv")).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("Date,Open,High,Low,Close,Volume,WMA(3)t"));
}

#[test]
fn missing_catalog_is_fatal() {
    let dir = setup();
    let mut config = config_for(dir.path());
    config.catalog.path = dir.path().join("nope.csv");

    let err = run_batch(&config, &NoProgress).unwrap_err();
    assert!(matches!(err, BatchError::Catalog(_)));
}

#[test]
fn catalog_without_ticker_column_is_fatal() {
    let dir = setup();
    fs::write(dir.path().join("tickers.csv"), "name,symbol\nAlpha,A\n").unwrap();

    let err = run_batch(&config_for(dir.path()), &NoProgress).unwrap_err();
    assert!(matches!(err, BatchError::Catalog(_)));
    assert!(err.to_string().contains("ticker"));
}

#[test]
fn every_symbol_failing_sets_exit_code() {
    let dir = setup();
    fs::write(dir.path().join("tickers.csv"), "ticker\nB\nBAD\n").unwrap();

    let report = run_batch(&config_for(dir.path()), &NoProgress).unwrap();
    assert!(report.all_failed());
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn fixture_symbol_runs_to_parquet_and_report_is_saved() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw");
    fs::create_dir_all(&raw).unwrap();
    fs::copy(fixture("mock_0005.HK.csv"), raw.join("0005.HK.csv")).unwrap();

    let mut config = config_for(dir.path());
    config.catalog.path = fixture("mock_tickers.csv");
    config.data.format = OutputFormat::Parquet;

    let report = run_batch(&config, &NoProgress).unwrap();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1); // 0011.HK has no raw file
    assert!(dir.path().join("out/0005.HK_preprocessed.parquet").exists());

    let json_path = dir.path().join("reports/run.json");
    save_report(&report, &json_path).unwrap();
    let json = fs::read_to_string(&json_path).unwrap();
    assert!(json.contains("0005.HK"));

    let csv_path = dir.path().join("reports/run.csv");
    save_report(&report, &csv_path).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("symbol,status,rows,bars,detail"));
}
