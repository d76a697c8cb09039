//! Ticker data store — cache-or-fetch resolution for one ticker.
//!
//! Decision per call:
//! 1. cache file present and no forced refresh → load it, provider untouched
//! 2. otherwise → fetch the trailing window from the provider, persist, return
//!
//! An empty provider result is `DataError::NoData` and nothing is written.
//! Every other failure propagates unchanged.

use super::cache::CsvCache;
use super::provider::{DataError, DataProvider, FetchWindow};
use crate::config::HeisenbuxConfig;
use crate::domain::PriceSeries;
use chrono::{DateTime, Utc};
use log::{info, warn};

/// Resolves tickers to price series through the on-disk cache.
pub struct TickerDataStore<'a> {
    provider: &'a dyn DataProvider,
    cache: CsvCache,
    lookback_days: u32,
}

impl<'a> TickerDataStore<'a> {
    pub fn new(provider: &'a dyn DataProvider, config: &HeisenbuxConfig) -> Self {
        Self::with_cache(provider, CsvCache::new(&config.cache_dir), config.lookback_days)
    }

    pub fn with_cache(provider: &'a dyn DataProvider, cache: CsvCache, lookback_days: u32) -> Self {
        Self {
            provider,
            cache,
            lookback_days,
        }
    }

    pub fn cache(&self) -> &CsvCache {
        &self.cache
    }

    /// Cached series when available, otherwise a fresh download.
    pub fn fetch_cached(&self, ticker: &str) -> Result<PriceSeries, DataError> {
        self.fetch(ticker, false)
    }

    /// Resolve `ticker` relative to the current time.
    pub fn fetch(&self, ticker: &str, force_refresh: bool) -> Result<PriceSeries, DataError> {
        self.fetch_at(ticker, force_refresh, Utc::now())
    }

    /// Resolve `ticker`, using `now` as the end of the download window.
    ///
    /// The uppercased ticker names the cache file; the provider receives the
    /// ticker exactly as given.
    pub fn fetch_at(
        &self,
        ticker: &str,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> Result<PriceSeries, DataError> {
        validate_ticker(ticker)?;
        self.cache.ensure_dir()?;

        let path = self.cache.path_for(ticker);
        if !force_refresh && path.is_file() {
            info!("Using cached data from {}", path.display());
            return self.cache.load(ticker);
        }

        let window = FetchWindow::trailing(now, self.lookback_days);
        info!("Fetching data for {ticker} from {}...", self.provider.name());
        let bars = self.provider.fetch(ticker, window)?;

        let series = PriceSeries::from_bars(bars).ok_or_else(|| DataError::NoData {
            ticker: ticker.to_string(),
        })?;

        let suspicious = series.bars().iter().filter(|b| !b.is_sane()).count();
        if suspicious > 0 {
            warn!("{suspicious} bar(s) for {ticker} have inconsistent OHLC values");
        }

        let saved = self.cache.store(ticker, &series)?;
        info!("Data saved to {}", saved.display());

        Ok(series)
    }
}

/// Reject tickers that cannot name a file inside the cache directory.
fn validate_ticker(ticker: &str) -> Result<(), DataError> {
    let invalid = |reason: &str| DataError::InvalidTicker {
        ticker: ticker.to_string(),
        reason: reason.to_string(),
    };

    if ticker.is_empty() {
        return Err(invalid("ticker must not be empty"));
    }
    if ticker.contains(['/', '\\']) || ticker == "." || ticker == ".." {
        return Err(invalid("ticker must not contain path separators"));
    }
    if ticker.chars().any(char::is_control) {
        return Err(invalid("ticker must not contain control characters"));
    }
    Ok(())
}
