//! Market data retrieval and caching

pub mod cache;
pub mod provider;
pub mod store;
pub mod yahoo;

pub use cache::CsvCache;
pub use provider::{DataError, DataProvider, FetchWindow};
pub use store::TickerDataStore;
pub use yahoo::YahooProvider;
