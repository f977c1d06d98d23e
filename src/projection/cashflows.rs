//! Cash-flow output structures for projections

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which leg of the lease produced a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentBasis {
    /// Lease runs during the year: contracted rent
    Passing,
    /// Lease ended before the year began: market rent
    Reversion,
    /// Lease starts after the year ends: nothing due
    NotCommenced,
}

/// Projected rent for one tenant in one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowCell {
    pub year: i32,

    /// Annual amount, rounded to cents
    pub amount: f64,

    /// Only populated for detailed projections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<RentBasis>,
}

/// One tenant's projected rents, one cell per projected year in ascending order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    pub tenant: String,
    pub cells: Vec<CashFlowCell>,
}

impl CashFlowRow {
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            cells: Vec::new(),
        }
    }

    pub fn add_cell(&mut self, cell: CashFlowCell) {
        self.cells.push(cell);
    }

    /// Amount projected for `year`, if that year is a column
    pub fn amount(&self, year: i32) -> Option<f64> {
        self.cells.iter().find(|c| c.year == year).map(|c| c.amount)
    }

    pub fn amounts(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.amount).collect()
    }

    pub fn total(&self) -> f64 {
        round_to_cents(self.cells.iter().map(|c| c.amount).sum())
    }
}

/// Complete projection: year columns plus one row per lease, in schedule order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowTable {
    pub valuation_date: NaiveDate,
    pub years: Vec<i32>,
    pub rows: Vec<CashFlowRow>,
}

impl CashFlowTable {
    pub fn new(valuation_date: NaiveDate, years: Vec<i32>) -> Self {
        Self {
            valuation_date,
            years,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: CashFlowRow) {
        self.rows.push(row);
    }

    /// Sum of all tenants' rent for each projected year
    pub fn year_totals(&self) -> Vec<(i32, f64)> {
        self.years
            .iter()
            .map(|&year| {
                let total: f64 = self.rows.iter().filter_map(|r| r.amount(year)).sum();
                (year, round_to_cents(total))
            })
            .collect()
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        let totals = self.year_totals();
        let total_rent = round_to_cents(totals.iter().map(|(_, t)| t).sum());
        let peak = totals
            .iter()
            .copied()
            .fold(None, |best: Option<(i32, f64)>, (year, total)| match best {
                Some((_, best_total)) if best_total >= total => best,
                _ => Some((year, total)),
            });

        ProjectionSummary {
            tenant_count: self.rows.len(),
            year_count: self.years.len(),
            first_year: self.years.first().copied(),
            last_year: self.years.last().copied(),
            total_rent,
            peak_year: peak.map(|(year, _)| year),
            peak_rent: peak.map(|(_, total)| total).unwrap_or(0.0),
        }
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub tenant_count: usize,
    pub year_count: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub total_rent: f64,
    pub peak_year: Option<i32>,
    pub peak_rent: f64,
}

/// Round to 2 decimal places, exact half-cents to even
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round_ties_even() / 100.0
}
