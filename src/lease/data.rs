//! Lease record structures matching the lease schedule format

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single tenant's lease from the lease schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseRecord {
    /// Tenant identifier as written in the schedule
    pub tenant: String,

    /// First day of the lease term
    pub lease_start: NaiveDate,

    /// Last day of the lease term
    pub lease_end: NaiveDate,

    /// Estimated annual rent if the unit were re-let today
    pub market_rent: f64,

    /// Contracted rent by calendar year (sparse)
    #[serde(default)]
    pub passing_rents: BTreeMap<i32, f64>,
}

impl LeaseRecord {
    /// Create a lease with no passing rents recorded
    pub fn new(
        tenant: impl Into<String>,
        lease_start: NaiveDate,
        lease_end: NaiveDate,
        market_rent: f64,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            lease_start,
            lease_end,
            market_rent,
            passing_rents: BTreeMap::new(),
        }
    }

    /// Builder-style helper to record the passing rent for a year
    pub fn with_passing_rent(mut self, year: i32, amount: f64) -> Self {
        self.passing_rents.insert(year, amount);
        self
    }

    /// Passing rent recorded for `year`, or 0 when the schedule has no value
    pub fn passing_rent(&self, year: i32) -> f64 {
        self.passing_rents.get(&year).copied().unwrap_or(0.0)
    }

    /// True if the lease ended before 1 January of `year`
    pub fn expired_before(&self, year: i32) -> bool {
        self.lease_end.year() < year
    }

    /// True if the lease starts after 31 December of `year`
    pub fn commences_after(&self, year: i32) -> bool {
        self.lease_start.year() > year
    }

    /// True if any day of the lease term falls inside `year`
    pub fn is_in_term(&self, year: i32) -> bool {
        !self.expired_before(year) && !self.commences_after(year)
    }
}

/// A loaded lease schedule
///
/// `rent_years` holds the years labelled by the schedule's passing-rent
/// columns. Those labels, not the individual records, decide which years can
/// appear in a projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaseTable {
    pub records: Vec<LeaseRecord>,
    pub rent_years: Vec<i32>,
}

impl LeaseTable {
    /// Build a table from records and column years (years are sorted and deduplicated)
    pub fn new(records: Vec<LeaseRecord>, mut rent_years: Vec<i32>) -> Self {
        rent_years.sort_unstable();
        rent_years.dedup();
        Self { records, rent_years }
    }

    /// Build a table whose column years are every year any record has a passing rent for
    pub fn from_records(records: Vec<LeaseRecord>) -> Self {
        let rent_years = records
            .iter()
            .flat_map(|r| r.passing_rents.keys().copied())
            .collect();
        Self::new(records, rent_years)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
