//! Domain types: daily bars and the price series built from them.

pub mod bar;
pub mod series;

pub use bar::DailyBar;
pub use series::PriceSeries;
