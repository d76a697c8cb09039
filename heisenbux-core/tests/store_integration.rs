//! Integration tests for the cache-or-fetch behaviour of the ticker data store.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use heisenbux_core::data::{CsvCache, DataError, DataProvider, FetchWindow, TickerDataStore};
use heisenbux_core::domain::{DailyBar, PriceSeries};

/// What the scripted provider answers with.
#[derive(Clone)]
enum Script {
    Bars(Vec<DailyBar>),
    Empty,
    NetworkDown,
}

struct ScriptedProvider {
    script: Mutex<Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn answer_with(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn tickers_seen(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl DataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self, ticker: &str, _window: FetchWindow) -> Result<Vec<DailyBar>, DataError> {
        self.calls.lock().unwrap().push(ticker.to_string());
        match self.script.lock().unwrap().clone() {
            Script::Bars(bars) => Ok(bars),
            Script::Empty => Ok(Vec::new()),
            Script::NetworkDown => Err(DataError::NetworkUnreachable("Network error".into())),
        }
    }
}

/// Daily bars for the 30 days before a fixed date, inclusive: 31 rows.
fn sample_bars(base: f64) -> Vec<DailyBar> {
    let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    (0..=30i32)
        .map(|i| {
            let step = f64::from(i) * 0.5;
            DailyBar {
                date: end - Duration::days(30 - i64::from(i)),
                open: base + step,
                high: base + 1.0 + step,
                low: base - 1.0 + step,
                close: base + 0.5 + step,
                volume: 1_000_000 + i as u64 * 10_000,
            }
        })
        .collect()
}

fn data_rows(path: &Path) -> usize {
    fs::read_to_string(path).unwrap().lines().skip(1).count()
}

#[test]
fn cache_miss_fetches_once_and_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(Script::Bars(sample_bars(100.0)));
    let store = TickerDataStore::with_cache(&provider, CsvCache::new(dir.path().join("cache")), 365);

    let series = store.fetch("TEST", false).unwrap();

    assert_eq!(provider.call_count(), 1);
    assert_eq!(series.len(), 31);
    let cache_file = dir.path().join("cache").join("TEST.csv");
    assert!(cache_file.is_file());
    assert_eq!(data_rows(&cache_file), 31);
}

#[test]
fn second_call_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(Script::Bars(sample_bars(100.0)));
    let store = TickerDataStore::with_cache(&provider, CsvCache::new(dir.path()), 365);

    let first = store.fetch("TEST", false).unwrap();
    let second = store.fetch("TEST", false).unwrap();

    assert_eq!(provider.call_count(), 1);
    assert_eq!(second.len(), 31);
    assert_eq!(first, second);
}

#[test]
fn existing_cache_file_is_used_without_provider() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CsvCache::new(dir.path());
    let cached = PriceSeries::from_bars(sample_bars(50.0)[..12].to_vec()).unwrap();
    cache.store("TEST", &cached).unwrap();

    let provider = ScriptedProvider::new(Script::NetworkDown);
    let store = TickerDataStore::with_cache(&provider, cache, 365);
    let series = store.fetch_cached("TEST").unwrap();

    assert_eq!(provider.call_count(), 0);
    assert_eq!(series.len(), data_rows(&dir.path().join("TEST.csv")));
    assert_eq!(series, cached);
}

#[test]
fn force_refresh_bypasses_and_overwrites_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CsvCache::new(dir.path());
    let stale = PriceSeries::from_bars(sample_bars(1.0)[..3].to_vec()).unwrap();
    cache.store("TEST", &stale).unwrap();

    let provider = ScriptedProvider::new(Script::Bars(sample_bars(100.0)));
    let store = TickerDataStore::with_cache(&provider, cache, 365);
    let series = store.fetch("TEST", true).unwrap();

    assert_eq!(provider.call_count(), 1);
    assert_eq!(series.len(), 31);
    assert_eq!(store.cache().load("TEST").unwrap(), series);
    assert_eq!(data_rows(&dir.path().join("TEST.csv")), 31);
}

#[test]
fn force_refresh_always_contacts_provider() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(Script::Bars(sample_bars(100.0)));
    let store = TickerDataStore::with_cache(&provider, CsvCache::new(dir.path()), 365);

    store.fetch("TEST", true).unwrap();
    store.fetch("TEST", true).unwrap();
    store.fetch("TEST", false).unwrap();

    assert_eq!(provider.call_count(), 2);
}

#[test]
fn empty_result_is_no_data_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(Script::Empty);
    let store = TickerDataStore::with_cache(&provider, CsvCache::new(dir.path()), 365);

    match store.fetch("NOPE", false) {
        Err(DataError::NoData { ticker }) => assert_eq!(ticker, "NOPE"),
        other => panic!("expected NoData error, got: {other:?}"),
    }
    assert!(!dir.path().join("NOPE.csv").exists());
}

#[test]
fn empty_refresh_leaves_existing_cache_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CsvCache::new(dir.path());
    let cached = PriceSeries::from_bars(sample_bars(100.0)).unwrap();
    cache.store("TEST", &cached).unwrap();
    let before = fs::read(dir.path().join("TEST.csv")).unwrap();

    let provider = ScriptedProvider::new(Script::Empty);
    let store = TickerDataStore::with_cache(&provider, cache, 365);
    let err = store.fetch("TEST", true).unwrap_err();

    assert!(matches!(err, DataError::NoData { .. }));
    assert_eq!(err.to_string(), "No data found for ticker TEST");
    assert_eq!(fs::read(dir.path().join("TEST.csv")).unwrap(), before);
}

#[test]
fn provider_error_propagates_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(Script::NetworkDown);
    let store = TickerDataStore::with_cache(&provider, CsvCache::new(dir.path()), 365);

    let err = store.fetch("TEST", false).unwrap_err();

    assert!(err.is_provider_error());
    assert!(err.to_string().contains("Network error"));
    assert!(!dir.path().join("TEST.csv").exists());
}

#[test]
fn provider_error_on_refresh_keeps_old_cache() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(Script::Bars(sample_bars(100.0)));
    let store = TickerDataStore::with_cache(&provider, CsvCache::new(dir.path()), 365);
    let original = store.fetch("TEST", false).unwrap();
    let before = fs::read(dir.path().join("TEST.csv")).unwrap();

    provider.answer_with(Script::NetworkDown);
    assert!(store.fetch("TEST", true).is_err());

    assert_eq!(fs::read(dir.path().join("TEST.csv")).unwrap(), before);
    assert_eq!(store.fetch("TEST", false).unwrap(), original);
}

#[test]
fn ticker_case_shares_cache_file_but_not_provider_argument() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(Script::Bars(sample_bars(100.0)));
    let store = TickerDataStore::with_cache(&provider, CsvCache::new(dir.path()), 365);

    store.fetch("aapl", false).unwrap();
    assert!(dir.path().join("AAPL.csv").is_file());

    // Same file: served from cache.
    store.fetch("AAPL", false).unwrap();
    assert_eq!(provider.tickers_seen(), vec!["aapl".to_string()]);

    // Forced: each casing goes to the provider as typed.
    store.fetch("AAPL", true).unwrap();
    store.fetch("aApL", true).unwrap();
    assert_eq!(
        provider.tickers_seen(),
        vec!["aapl".to_string(), "AAPL".to_string(), "aApL".to_string()]
    );

    let files: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["AAPL.csv".to_string()]);
}

#[test]
fn fetched_series_is_sorted_and_unique() {
    let dir = tempfile::tempdir().unwrap();
    let mut bars = sample_bars(100.0);
    bars.reverse();
    bars.push(bars[0]);
    let provider = ScriptedProvider::new(Script::Bars(bars));
    let store = TickerDataStore::with_cache(&provider, CsvCache::new(dir.path()), 365);

    let series = store
        .fetch_at("TEST", false, Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap())
        .unwrap();

    assert_eq!(series.len(), 31);
    for window in series.bars().windows(2) {
        assert!(window[0].date < window[1].date);
    }
}

#[test]
fn corrupt_cache_file_is_reported_not_refetched() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("TEST.csv"), "Date,Open\nnot-a-date,1\n").unwrap();
    let provider = ScriptedProvider::new(Script::Bars(sample_bars(100.0)));
    let store = TickerDataStore::with_cache(&provider, CsvCache::new(dir.path()), 365);

    let err = store.fetch("TEST", false).unwrap_err();

    assert!(err.is_io_error());
    assert_eq!(provider.call_count(), 0);

    // A forced refresh repairs it.
    assert_eq!(store.fetch("TEST", true).unwrap().len(), 31);
}

#[test]
fn unwritable_cache_dir_is_io_error_before_provider() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    fs::write(&cache_dir, "not a directory").unwrap();
    let provider = ScriptedProvider::new(Script::Bars(sample_bars(100.0)));
    let store = TickerDataStore::with_cache(&provider, CsvCache::new(&cache_dir), 365);

    for force in [false, true] {
        match store.fetch("TEST", force) {
            Err(DataError::Io { path, .. }) => assert_eq!(path, cache_dir),
            other => panic!("expected Io error, got: {other:?}"),
        }
    }

    assert_eq!(provider.call_count(), 0);
    assert!(cache_dir.is_file());
    assert_eq!(fs::read_to_string(&cache_dir).unwrap(), "not a directory");
}
