//! Projection window: which calendar years a projection covers

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of years projected from the valuation year
pub const DEFAULT_HORIZON_YEARS: u32 = 10;

/// The years [valuation_year, valuation_year + horizon) seen from a valuation date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionWindow {
    pub valuation_date: NaiveDate,
    pub horizon_years: u32,
}

impl ProjectionWindow {
    pub fn new(valuation_date: NaiveDate, horizon_years: u32) -> Self {
        Self {
            valuation_date,
            horizon_years,
        }
    }

    /// Calendar year of the valuation date; only the year matters for selection
    pub fn valuation_year(&self) -> i32 {
        self.valuation_date.year()
    }

    /// First year after the window (exclusive bound)
    pub fn end_year(&self) -> i32 {
        let horizon = i32::try_from(self.horizon_years).unwrap_or(i32::MAX);
        self.valuation_year().saturating_add(horizon)
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.valuation_year() && year < self.end_year()
    }

    /// Keep the candidate years that fall inside the window, ascending and unique
    pub fn select_years(&self, candidates: &[i32]) -> Vec<i32> {
        let mut years: Vec<i32> = candidates.iter().copied().filter(|y| self.contains(*y)).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// 1 January of `year`
    pub fn year_start(year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, 1, 1)
    }

    /// 31 December of `year`
    pub fn year_end(year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, 12, 31)
    }
}
