//! Core projection engine: term and reversion rent per tenant per year

use crate::error::{ProjectionError, Result};
use crate::lease::loader::{MARKET_RENT_COLUMN, PASSING_RENT_PREFIX, TENANT_COLUMN};
use crate::lease::{LeaseRecord, LeaseTable};
use super::cashflows::{round_to_cents, CashFlowCell, CashFlowRow, CashFlowTable, RentBasis};
use super::window::{ProjectionWindow, DEFAULT_HORIZON_YEARS};
use chrono::NaiveDate;
use log::{debug, info};

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionConfig {
    /// Number of years projected from the valuation year
    pub horizon_years: u32,

    /// Record which rent basis produced each cell
    pub detailed_output: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
            detailed_output: false,
        }
    }
}

/// Rent due from `lease` in `year`, and which rule produced it
///
/// Rules apply in order:
/// 1. lease ended before 1 Jan: market rent (reversion)
/// 2. lease starts after 31 Dec: nothing
/// 3. otherwise: the passing rent recorded for the year, 0 if none
pub fn rent_for_year(lease: &LeaseRecord, year: i32) -> (RentBasis, f64) {
    if lease.expired_before(year) {
        (RentBasis::Reversion, round_to_cents(lease.market_rent))
    } else if lease.commences_after(year) {
        (RentBasis::NotCommenced, 0.0)
    } else {
        (RentBasis::Passing, round_to_cents(lease.passing_rent(year)))
    }
}

/// Main projection engine
#[derive(Debug, Clone, Default)]
pub struct CashFlowProjector {
    config: ProjectionConfig,
}

impl CashFlowProjector {
    /// Create a new projector with the given config
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Window of years seen from `valuation_date`
    pub fn window(&self, valuation_date: NaiveDate) -> ProjectionWindow {
        ProjectionWindow::new(valuation_date, self.config.horizon_years)
    }

    /// Project every lease in the schedule
    ///
    /// Fails without partial output if any record carries an unusable value.
    pub fn project(&self, table: &LeaseTable, valuation_date: NaiveDate) -> Result<CashFlowTable> {
        for (i, lease) in table.records.iter().enumerate() {
            validate_record(lease, i + 2)?;
        }

        let window = self.window(valuation_date);
        let years = window.select_years(&table.rent_years);
        if years.is_empty() {
            info!(
                "No passing rent columns fall in {}..{}; projection has no year columns",
                window.valuation_year(),
                window.end_year()
            );
        } else {
            debug!("Projecting {} leases over years {:?}", table.len(), years);
        }

        let mut result = CashFlowTable::new(valuation_date, years);
        for lease in &table.records {
            let row = self.project_record(lease, &result.years);
            result.add_row(row);
        }

        Ok(result)
    }

    /// Project a single lease over already-selected years
    pub fn project_record(&self, lease: &LeaseRecord, years: &[i32]) -> CashFlowRow {
        let mut row = CashFlowRow::new(lease.tenant.clone());
        for &year in years {
            row.add_cell(self.project_cell(lease, year));
        }
        row
    }

    /// Project a single lease for a single year
    pub fn project_cell(&self, lease: &LeaseRecord, year: i32) -> CashFlowCell {
        let (basis, amount) = rent_for_year(lease, year);
        CashFlowCell {
            year,
            amount,
            basis: self.config.detailed_output.then_some(basis),
        }
    }
}

/// Project a schedule with the default 10-year, non-detailed configuration
pub fn project_leases(table: &LeaseTable, valuation_date: NaiveDate) -> Result<CashFlowTable> {
    CashFlowProjector::default().project(table, valuation_date)
}

/// Reject records built in code with values the loader would never produce
fn validate_record(lease: &LeaseRecord, row: usize) -> Result<()> {
    if lease.tenant.trim().is_empty() {
        return Err(ProjectionError::MissingValue {
            row,
            column: TENANT_COLUMN.to_string(),
        });
    }

    let check = |column: String, amount: f64| {
        if amount.is_finite() && amount >= 0.0 {
            Ok(())
        } else {
            Err(ProjectionError::InvalidAmount {
                row,
                column,
                value: amount.to_string(),
            })
        }
    };

    check(MARKET_RENT_COLUMN.to_string(), lease.market_rent)?;
    for (year, amount) in &lease.passing_rents {
        check(format!("{}{}", PASSING_RENT_PREFIX, year), *amount)?;
    }
    Ok(())
}
