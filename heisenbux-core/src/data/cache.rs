//! CSV cache layer.
//!
//! Layout: `{cache_dir}/{TICKER}.csv`, one file per uppercased ticker, with
//! the header `Date,Open,High,Low,Close,Volume`.
//!
//! Writes are atomic (write to `.csv.tmp`, rename into place), so a failed
//! write never leaves a truncated cache file behind. Loads accept files
//! written by pandas-based tooling too: timestamped dates are cut down to the
//! calendar date and unknown trailing columns are ignored.

use super::provider::DataError;
use crate::domain::{DailyBar, PriceSeries};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const CACHE_EXTENSION: &str = "csv";

/// One row of the cache file.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    #[serde(rename = "Date", alias = "Datetime", deserialize_with = "deserialize_date")]
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume", deserialize_with = "deserialize_volume")]
    volume: u64,
}

impl From<&DailyBar> for CacheRow {
    fn from(bar: &DailyBar) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

impl From<CacheRow> for DailyBar {
    fn from(row: CacheRow) -> Self {
        Self {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// Parse `2024-01-02`, `2024-01-02 00:00:00` or `2024-01-02 00:00:00-05:00`
/// into the calendar date as written (no timezone conversion).
fn parse_cache_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

fn deserialize_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_cache_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised date '{raw}'")))
}

/// Volume is an integer, but some writers emit it as `1234.0`.
fn deserialize_volume<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v >= 0.0 && v < u64::MAX as f64 && v.fract() == 0.0 => Ok(v as u64),
        _ => Err(serde::de::Error::custom(format!("invalid volume '{raw}'"))),
    }
}

fn csv_error(path: &Path, err: csv::Error) -> DataError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => DataError::Io {
            path: path.to_path_buf(),
            source,
        },
        _ => DataError::CacheFormat {
            path: path.to_path_buf(),
            message,
        },
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DataError + '_ {
    move |source| DataError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// The on-disk price cache.
#[derive(Debug, Clone)]
pub struct CsvCache {
    cache_dir: PathBuf,
}

impl CsvCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the cache file for a ticker: `{cache_dir}/{TICKER}.csv`.
    ///
    /// The ticker is uppercased here and only here; callers keep their
    /// original casing for everything else.
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{CACHE_EXTENSION}", ticker.to_uppercase()))
    }

    /// Create the cache directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), DataError> {
        fs::create_dir_all(&self.cache_dir).map_err(io_error(&self.cache_dir))
    }

    /// Whether a cache file exists for the ticker.
    pub fn exists(&self, ticker: &str) -> bool {
        self.path_for(ticker).is_file()
    }

    /// Write a series for a ticker, replacing any previous file.
    pub fn store(&self, ticker: &str, series: &PriceSeries) -> Result<PathBuf, DataError> {
        self.ensure_dir()?;

        let path = self.path_for(ticker);
        let tmp_path = path.with_extension(format!("{CACHE_EXTENSION}.tmp"));

        if let Err(e) = write_rows(&tmp_path, series) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            DataError::Io {
                path: path.clone(),
                source,
            }
        })?;

        Ok(path)
    }

    /// Load the cached series for a ticker.
    ///
    /// A file without data rows is reported as `NoData`. Dates must be
    /// strictly ascending; a repeated or out-of-order date is `CacheFormat`.
    pub fn load(&self, ticker: &str) -> Result<PriceSeries, DataError> {
        let path = self.path_for(ticker);
        let file = fs::File::open(&path).map_err(io_error(&path))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut bars: Vec<DailyBar> = Vec::new();
        for row in reader.deserialize::<CacheRow>() {
            let bar = DailyBar::from(row.map_err(|e| csv_error(&path, e))?);
            if !bar.is_finite() {
                return Err(DataError::CacheFormat {
                    path,
                    message: format!("non-finite price on {}", bar.date),
                });
            }
            if let Some(prev) = bars.last() {
                if bar.date == prev.date {
                    return Err(DataError::CacheFormat {
                        path,
                        message: format!("duplicate date {}", bar.date),
                    });
                }
                if bar.date < prev.date {
                    return Err(DataError::CacheFormat {
                        path,
                        message: format!("out-of-order date {} after {}", bar.date, prev.date),
                    });
                }
            }
            bars.push(bar);
        }

        PriceSeries::from_bars(bars).ok_or_else(|| DataError::NoData {
            ticker: ticker.to_string(),
        })
    }
}

fn write_rows(path: &Path, series: &PriceSeries) -> Result<(), DataError> {
    let file = fs::File::create(path).map_err(io_error(path))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    for bar in series.bars() {
        writer
            .serialize(CacheRow::from(bar))
            .map_err(|e| csv_error(path, e))?;
    }
    writer.flush().map_err(io_error(path))?;
    Ok(())
}
