//! PriceSeries — an ordered, non-empty run of daily bars.

use super::bar::DailyBar;
use chrono::NaiveDate;

/// Daily price history for one ticker.
///
/// Invariants enforced at construction:
/// - at least one bar (an empty result is "no data", never a valid series)
/// - bars sorted by ascending date
/// - no two bars share a date
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<DailyBar>,
}

impl PriceSeries {
    /// Build a series from bars in any order.
    ///
    /// Bars are sorted by date. When several bars share a date the last one
    /// in input order wins, which is how providers report a revised bar for
    /// the current session. Returns `None` when `bars` is empty.
    pub fn from_bars(mut bars: Vec<DailyBar>) -> Option<Self> {
        if bars.is_empty() {
            return None;
        }

        // Stable sort keeps input order within a date, so the last duplicate
        // is the one retained below.
        bars.sort_by_key(|b| b.date);
        let mut canonical: Vec<DailyBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match canonical.last_mut() {
                Some(prev) if prev.date == bar.date => *prev = bar,
                _ => canonical.push(bar),
            }
        }

        Some(Self { bars: canonical })
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<DailyBar> {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; kept so the type reads like a collection.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> &DailyBar {
        &self.bars[0]
    }

    pub fn last(&self) -> &DailyBar {
        &self.bars[self.bars.len() - 1]
    }

    /// First and last trading date covered.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.first().date, self.last().date)
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.bars.iter().map(|b| (b.date, b.close))
    }
}
