//! Heisenbux Core — daily price history for a ticker, cached on disk.
//!
//! This crate contains:
//! - Domain types (daily bars, the price series)
//! - The market-data provider trait and its Yahoo Finance implementation
//! - The CSV cache keyed by uppercased ticker
//! - The ticker data store that decides between cache and provider
//! - Runtime configuration shared with the renderer and CLI

pub mod config;
pub mod data;
pub mod domain;

pub use config::{ChartConfig, ConfigError, HeisenbuxConfig};
pub use data::{CsvCache, DataError, DataProvider, FetchWindow, TickerDataStore, YahooProvider};
pub use domain::{DailyBar, PriceSeries};
