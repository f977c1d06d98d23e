//! Portfolio runner for batch projections
//!
//! Projects many lease schedules (one per property) in parallel with the same
//! configuration, and merges their yearly totals.

use crate::error::{ProjectionError, Result};
use crate::lease::{is_lease_file, load_leases, LeaseTable};
use crate::projection::{round_to_cents, CashFlowProjector, CashFlowTable, ProjectionConfig};
use chrono::NaiveDate;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Projection of one property's lease schedule
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyProjection {
    pub name: String,
    pub cash_flow: CashFlowTable,
}

/// Batch runner sharing one projector across properties
///
/// # Example
/// ```ignore
/// let runner = PortfolioRunner::new();
/// let properties = load_portfolio_dir("leases/")?;
/// let results = runner.run_batch(&properties, valuation_date)?;
/// let totals = aggregate_totals(results.iter().map(|p| &p.cash_flow));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PortfolioRunner {
    projector: CashFlowProjector,
}

impl PortfolioRunner {
    /// Create runner with the default 10-year configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProjectionConfig) -> Self {
        Self {
            projector: CashFlowProjector::new(config),
        }
    }

    pub fn projector(&self) -> &CashFlowProjector {
        &self.projector
    }

    /// Run a single projection
    pub fn run(&self, table: &LeaseTable, valuation_date: NaiveDate) -> Result<CashFlowTable> {
        self.projector.project(table, valuation_date)
    }

    /// Project every property in parallel; results keep the input order
    ///
    /// The first failing property aborts the batch.
    pub fn run_batch(
        &self,
        properties: &[(String, LeaseTable)],
        valuation_date: NaiveDate,
    ) -> Result<Vec<PropertyProjection>> {
        properties
            .par_iter()
            .map(|(name, table)| {
                self.projector
                    .project(table, valuation_date)
                    .map(|cash_flow| PropertyProjection {
                        name: name.clone(),
                        cash_flow,
                    })
                    .map_err(|e| e.for_property(name.as_str()))
            })
            .collect()
    }

    /// Project one schedule from several valuation dates
    pub fn run_valuation_dates(
        &self,
        table: &LeaseTable,
        valuation_dates: &[NaiveDate],
    ) -> Result<Vec<CashFlowTable>> {
        valuation_dates
            .par_iter()
            .map(|date| self.projector.project(table, *date))
            .collect()
    }
}

/// Sum yearly totals across projections; years missing from a projection contribute nothing
pub fn aggregate_totals<'a, I>(projections: I) -> BTreeMap<i32, f64>
where
    I: IntoIterator<Item = &'a CashFlowTable>,
{
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for projection in projections {
        for (year, total) in projection.year_totals() {
            *totals.entry(year).or_default() += total;
        }
    }
    for total in totals.values_mut() {
        *total = round_to_cents(*total);
    }
    totals
}

/// Load every lease schedule in `dir`, named by file stem, sorted by file name
///
/// Files `load_leases` cannot read are skipped.
pub fn load_portfolio_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<(String, LeaseTable)>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && is_lease_file(&path) {
            paths.push(path);
        } else {
            warn!("Skipping {}", path.display());
        }
    }
    paths.sort();

    let properties = paths
        .par_iter()
        .map(|path| {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            load_leases(path)
                .map(|table| (name.clone(), table))
                .map_err(|e: ProjectionError| e.for_property(name))
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Loaded {} lease schedules from {}", properties.len(), dir.as_ref().display());
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lease::{sample_lease_table, LeaseRecord};
    use crate::lease::sample::write_lease_csv;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn single_tenant(rent: f64) -> LeaseTable {
        let lease = LeaseRecord::new("Solo", date(2020, 1, 1), date(2030, 12, 31), rent)
            .with_passing_rent(2024, rent)
            .with_passing_rent(2025, rent);
        LeaseTable::from_records(vec![lease])
    }

    #[test]
    fn test_batch_keeps_order() {
        let runner = PortfolioRunner::new();
        let properties = vec![
            ("tower".to_string(), sample_lease_table()),
            ("mall".to_string(), single_tenant(50_000.0)),
        ];

        let results = runner.run_batch(&properties, date(2024, 1, 1)).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "tower");
        assert_eq!(results[1].name, "mall");
        assert_eq!(results[1].cash_flow.years, vec![2024, 2025]);
    }

    #[test]
    fn test_batch_error_names_property() {
        let mut broken = single_tenant(1.0);
        broken.records[0].market_rent = -1.0;
        let properties = vec![
            ("good".to_string(), single_tenant(1.0)),
            ("bad".to_string(), broken),
        ];

        let err = PortfolioRunner::new().run_batch(&properties, date(2024, 1, 1)).unwrap_err();
        assert!(err.to_string().starts_with("bad: "));
    }

    #[test]
    fn test_aggregate_totals_merges_years() {
        let runner = PortfolioRunner::new();
        let a = runner.run(&sample_lease_table(), date(2024, 1, 1)).unwrap();
        let b = runner.run(&single_tenant(50_000.0), date(2024, 1, 1)).unwrap();

        let totals = aggregate_totals([&a, &b]);
        // 2024: Tenant A 102000 + Tenant B 120000 + Solo 50000
        assert_relative_eq!(totals[&2024], 272_000.0);
        // 2029 only exists in the sample schedule: A reverts (120000) + B 135000
        assert_relative_eq!(totals[&2029], 255_000.0);
        assert_eq!(totals.keys().copied().collect::<Vec<_>>(), (2024..=2029).collect::<Vec<_>>());
    }

    #[test]
    fn test_valuation_dates_shift_window() {
        let runner = PortfolioRunner::with_config(ProjectionConfig {
            horizon_years: 2,
            ..Default::default()
        });
        let results = runner
            .run_valuation_dates(&sample_lease_table(), &[date(2023, 1, 1), date(2028, 6, 30)])
            .unwrap();
        assert_eq!(results[0].years, vec![2023, 2024]);
        assert_eq!(results[1].years, vec![2028, 2029]);
    }

    #[test]
    fn test_load_portfolio_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_lease_csv(&sample_lease_table(), std::fs::File::create(dir.path().join("b_tower.csv")).unwrap())
            .unwrap();
        write_lease_csv(&single_tenant(10.0), std::fs::File::create(dir.path().join("a_mall.csv")).unwrap())
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let properties = load_portfolio_dir(dir.path()).unwrap();
        let names: Vec<&str> = properties.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a_mall", "b_tower"]);
        assert_eq!(properties[1].1.len(), 2);
    }

    #[test]
    fn test_load_portfolio_dir_reads_every_workbook_kind() {
        let dir = tempfile::tempdir().unwrap();
        write_lease_csv(&sample_lease_table(), std::fs::File::create(dir.path().join("a_tower.csv")).unwrap())
            .unwrap();
        std::fs::write(dir.path().join("b_depot.xlsb"), "not a workbook").unwrap();

        // The binary workbook is attempted, not skipped, so its failure surfaces
        let err = load_portfolio_dir(dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("b_depot: "));
    }
}
