//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over the market-data source so the store
//! can be driven by Yahoo Finance in production and by a scripted provider in
//! tests.

use crate::domain::DailyBar;
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data operations.
///
/// These are displayed verbatim by the CLI after an `Error: ` prefix.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("No data found for ticker {ticker}")]
    NoData { ticker: String },

    /// The ticker cannot name a cache file: empty, a path separator, `.`/`..`,
    /// or a control character. Other strings, whitespace included, pass.
    #[error("invalid ticker '{ticker}': {reason}")]
    InvalidTicker { ticker: String, reason: String },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("provider returned HTTP {status} for {ticker}")]
    Http { status: u16, ticker: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed cache file {}: {message}", path.display())]
    CacheFormat { path: PathBuf, message: String },
}

impl DataError {
    /// True for failures raised by the market-data provider (transport,
    /// rate limiting, unexpected responses).
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_)
                | DataError::RateLimited { .. }
                | DataError::AuthenticationRequired(_)
                | DataError::Http { .. }
                | DataError::ResponseFormatChanged(_)
        )
    }

    /// True for failures reading or writing the on-disk cache.
    pub fn is_io_error(&self) -> bool {
        matches!(self, DataError::Io { .. } | DataError::CacheFormat { .. })
    }
}

/// Inclusive request window `[start, end]` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    /// Window covering the `days` calendar days that end at `now`.
    pub fn trailing(now: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: now - Duration::days(i64::from(days)),
            end: now,
        }
    }
}

/// Trait for market-data providers.
///
/// Implementations only fetch. The cache layer sits above this trait, so
/// providers never see the filesystem. An unknown ticker or an empty window is
/// reported as `Ok` with no bars; the caller decides what "no data" means.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for `ticker` over `window`.
    ///
    /// `ticker` is passed through exactly as the caller supplied it.
    fn fetch(&self, ticker: &str, window: FetchWindow) -> Result<Vec<DailyBar>, DataError>;
}
