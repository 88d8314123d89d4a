//! Raw daily series reader.
//!
//! Accepts `Date, Open, High, Low, Close, Volume[, Adj Close]` in any column
//! order, matched case-insensitively by name. Also accepts the multi-row header
//! that recent Yahoo Finance exports use:
//!
//! ```text
//! Price,Adj Close,Close,High,Low,Open,Volume
//! Ticker,0005.HK,0005.HK,0005.HK,0005.HK,0005.HK,0005.HK
//! Date,,,,,,
//! 2024-01-02,60.1,61.0,61.5,60.6,61.2,1200000
//! ```
//!
//! Empty or `null`/`NaN` cells read as NaN; any other unparsable cell, a
//! missing `Close` column or an empty series is malformed.

use super::repository::SeriesError;
use crate::domain::Bar;
use chrono::NaiveDate;
use std::io::Read;

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
    adj_close: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &csv::StringRecord) -> Result<(Self, bool), SeriesError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        // Multi-row Yahoo layout: the first header cell is "Price" and the
        // date values live under it.
        let (date, multi_row) = match find("Date") {
            Some(idx) => (idx, false),
            None => match find("Price") {
                Some(idx) => (idx, true),
                None => return Err(SeriesError::Malformed("missing 'Date' column".into())),
            },
        };

        let close = find("Close")
            .ok_or_else(|| SeriesError::Malformed("missing 'Close' column".into()))?;

        Ok((
            Self {
                date,
                open: find("Open"),
                high: find("High"),
                low: find("Low"),
                close,
                volume: find("Volume"),
                adj_close: find("Adj Close"),
            },
            multi_row,
        ))
    }
}

/// Read an ordered bar series from CSV.
///
/// Bars are returned sorted by date ascending; a repeated date is malformed.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, SeriesError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = rdr.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(SeriesError::Malformed("empty series".into())),
    };
    let (columns, multi_row) = ColumnMap::from_header(&header)?;

    let mut bars = Vec::new();
    for (row, record) in records.enumerate() {
        let record = record?;
        let first = record.get(0).unwrap_or("").trim();
        let is_header_row =
            first.eq_ignore_ascii_case("Ticker") || first.eq_ignore_ascii_case("Date");
        if multi_row && is_header_row {
            continue;
        }
        // header is line 1
        let line = row + 2;
        bars.push(parse_bar(&record, &columns, line)?);
    }

    if bars.is_empty() {
        return Err(SeriesError::Malformed("empty series".into()));
    }

    bars.sort_by_key(|b| b.date);
    if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(SeriesError::Malformed(format!(
            "duplicate date {}",
            pair[0].date
        )));
    }

    Ok(bars)
}

fn parse_bar(
    record: &csv::StringRecord,
    columns: &ColumnMap,
    line: usize,
) -> Result<Bar, SeriesError> {
    let date_cell = record.get(columns.date).unwrap_or("").trim();
    let date = parse_date(date_cell).ok_or_else(|| {
        SeriesError::Malformed(format!("line {line}: invalid date '{date_cell}'"))
    })?;

    let number = |idx: Option<usize>, name: &str| -> Result<f64, SeriesError> {
        match idx {
            None => Ok(f64::NAN),
            Some(i) => parse_number(record.get(i).unwrap_or("")).ok_or_else(|| {
                SeriesError::Malformed(format!(
                    "line {line}: invalid {name} '{}'",
                    record.get(i).unwrap_or("").trim()
                ))
            }),
        }
    };

    Ok(Bar {
        date,
        open: number(columns.open, "Open")?,
        high: number(columns.high, "High")?,
        low: number(columns.low, "Low")?,
        close: number(Some(columns.close), "Close")?,
        volume: number(columns.volume, "Volume")?,
        adj_close: match columns.adj_close {
            Some(_) => Some(number(columns.adj_close, "Adj Close")?),
            None => None,
        },
    })
}

/// `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(cell: &str) -> Option<NaiveDate> {
    let day = cell.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("null") || cell.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}
