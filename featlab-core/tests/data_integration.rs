//! Integration tests for the filesystem repository using the frozen 0005.HK fixture.

use featlab_core::data::{
    FsRepository, OutputFormat, SeriesError, SymbolCatalog, TimeSeriesRepository,
};
use featlab_core::domain::{expected_rows, LAG_DEPTH};
use featlab_core::features::FeaturePipeline;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Temp workspace with `raw/0005.HK.csv` copied from the fixture.
fn setup_raw_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw");
    fs::create_dir_all(&raw).unwrap();
    fs::copy(
        fixture_dir().join("mock_0005.HK.csv"),
        raw.join("0005.HK.csv"),
    )
    .unwrap();
    dir
}

fn repo(dir: &Path, format: OutputFormat) -> FsRepository {
    FsRepository::new(dir.join("raw"), dir.join("preprocessed")).with_format(format)
}

#[test]
fn fixture_loads_in_date_order() {
    let dir = setup_raw_dir();
    let bars = repo(dir.path(), OutputFormat::Csv)
        .load_bars("0005.HK")
        .unwrap();

    assert_eq!(bars.len(), 30);
    for pair in bars.windows(2) {
        assert!(pair[0].date < pair[1].date);
    }
    assert!(bars.iter().all(|b| b.adj_close.is_some()));
    assert!(bars.iter().all(|b| b.is_sane()));
}

#[test]
fn csv_output_drops_adj_close_and_warmup_rows() {
    let dir = setup_raw_dir();
    let repo = repo(dir.path(), OutputFormat::Csv);
    let bars = repo.load_bars("0005.HK").unwrap();

    let set = FeaturePipeline::default().run(&bars);
    let location = repo.store_features("0005.HK", &set).unwrap();
    assert!(location.ends_with("0005.HK_preprocessed.csv"));

    let text = fs::read_to_string(&location).unwrap();
    let header = text.lines().next().unwrap();
    assert!(!header.contains("Adj Close"));
    assert!(header.ends_with("WMA(3)t-5"));
    assert_eq!(header.split(',').count(), 7 + LAG_DEPTH);

    // header + one line per complete row
    assert_eq!(text.lines().count(), 1 + expected_rows(30, 3));
    for line in text.lines().skip(1) {
        assert_eq!(line.split(',').count(), 7 + LAG_DEPTH);
        assert!(line.split(',').all(|cell| !cell.is_empty() && cell != "NaN"));
    }

    // First output row is the (period - 1 + LAG_DEPTH)th bar.
    let first_date = text.lines().nth(1).unwrap().split(',').next().unwrap();
    assert_eq!(first_date, bars[2 + LAG_DEPTH].date.to_string());
}

#[test]
fn rerun_overwrites_with_identical_bytes() {
    let dir = setup_raw_dir();
    let repo = repo(dir.path(), OutputFormat::Csv);
    let pipeline = FeaturePipeline::new(4).unwrap();

    let first = repo
        .store_features("0005.HK", &pipeline.run(&repo.load_bars("0005.HK").unwrap()))
        .unwrap();
    let first_bytes = fs::read(&first).unwrap();

    let second = repo
        .store_features("0005.HK", &pipeline.run(&repo.load_bars("0005.HK").unwrap()))
        .unwrap();
    let second_bytes = fs::read(&second).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn input_without_adj_close_is_unaffected() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw");
    fs::create_dir_all(&raw).unwrap();

    // Same fixture minus the Adj Close column.
    let text = fs::read_to_string(fixture_dir().join("mock_0005.HK.csv")).unwrap();
    let stripped: Vec<String> = text
        .lines()
        .map(|line| {
            let cells: Vec<&str> = line.split(',').collect();
            [&cells[..5], &cells[6..]].concat().join(",")
        })
        .collect();
    fs::write(raw.join("0005.HK.csv"), stripped.join("\n")).unwrap();
    fs::copy(
        fixture_dir().join("mock_0005.HK.csv"),
        raw.join("WITH_ADJ.csv"),
    )
    .unwrap();

    let repo = repo(dir.path(), OutputFormat::Csv);
    let pipeline = FeaturePipeline::default();
    let without = pipeline.run(&repo.load_bars("0005.HK").unwrap());
    let with = pipeline.run(&repo.load_bars("WITH_ADJ").unwrap());

    assert_eq!(without, with);
}

#[test]
fn parquet_output_has_canonical_schema() {
    let dir = setup_raw_dir();
    let repo = repo(dir.path(), OutputFormat::Parquet);
    let set = FeaturePipeline::default().run(&repo.load_bars("0005.HK").unwrap());

    let location = repo.store_features("0005.HK", &set).unwrap();
    assert!(location.ends_with("0005.HK_preprocessed.parquet"));

    let file = fs::File::open(&location).unwrap();
    let df = ParquetReader::new(file).finish().unwrap();

    assert_eq!(df.height(), set.len());
    assert_eq!(df.width(), 7 + LAG_DEPTH);
    let schema = df.schema();
    assert!(schema.contains("Date"));
    assert!(schema.contains("WMA(3)t-1"));
    assert!(!schema.contains("Adj Close"));

    let wma = df.column("WMA(3)t").unwrap().f64().unwrap();
    assert_eq!(wma.get(0), Some(set.rows[0].wma));
}

#[test]
fn missing_symbol_is_not_found() {
    let dir = setup_raw_dir();
    let err = repo(dir.path(), OutputFormat::Csv)
        .load_bars("0011.HK")
        .unwrap_err();
    assert!(matches!(err, SeriesError::NotFound { .. }));
}

#[test]
fn fixture_catalog_lists_both_banks() {
    let catalog =
        SymbolCatalog::from_path(&fixture_dir().join("mock_tickers.csv"), "ticker").unwrap();
    assert_eq!(catalog.symbols(), ["0005.HK", "0011.HK"]);
}
