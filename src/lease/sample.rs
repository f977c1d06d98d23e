//! Sample lease schedule in the input format
//!
//! Gives users a template to fill in and the tests a known two-tenant case.

use super::loader::{
    LEASE_END_COLUMN, LEASE_START_COLUMN, MARKET_RENT_COLUMN, PASSING_RENT_PREFIX, TENANT_COLUMN,
};
use super::{LeaseRecord, LeaseTable};
use crate::error::Result;
use chrono::NaiveDate;
use log::info;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

pub const SAMPLE_SHEET_NAME: &str = "Sample Data";

const SAMPLE_YEARS: [i32; 7] = [2023, 2024, 2025, 2026, 2027, 2028, 2029];

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// The two-tenant sample schedule
pub fn sample_lease_table() -> LeaseTable {
    let tenant_a_rents = [100_000.0, 102_000.0, 104_000.0, 106_000.0, 108_000.0, 0.0, 0.0];
    let tenant_b_rents = [0.0, 120_000.0, 123_000.0, 126_000.0, 129_000.0, 132_000.0, 135_000.0];

    let mut tenant_a = LeaseRecord::new("Tenant A", ymd(2023, 1, 1), ymd(2027, 12, 31), 120_000.0);
    let mut tenant_b = LeaseRecord::new("Tenant B", ymd(2024, 6, 1), ymd(2029, 5, 31), 140_000.0);
    for (i, year) in SAMPLE_YEARS.iter().enumerate() {
        tenant_a.passing_rents.insert(*year, tenant_a_rents[i]);
        tenant_b.passing_rents.insert(*year, tenant_b_rents[i]);
    }

    LeaseTable::new(vec![tenant_a, tenant_b], SAMPLE_YEARS.to_vec())
}

fn header_row(table: &LeaseTable) -> Vec<String> {
    let mut headers = vec![
        TENANT_COLUMN.to_string(),
        LEASE_START_COLUMN.to_string(),
        LEASE_END_COLUMN.to_string(),
        MARKET_RENT_COLUMN.to_string(),
    ];
    headers.extend(table.rent_years.iter().map(|y| format!("{}{}", PASSING_RENT_PREFIX, y)));
    headers
}

/// Write a lease schedule as CSV in the input format
pub fn write_lease_csv<W: std::io::Write>(table: &LeaseTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header_row(table))?;

    for lease in &table.records {
        let mut row = vec![
            lease.tenant.clone(),
            lease.lease_start.to_string(),
            lease.lease_end.to_string(),
            lease.market_rent.to_string(),
        ];
        row.extend(table.rent_years.iter().map(|y| match lease.passing_rents.get(y) {
            Some(amount) => amount.to_string(),
            None => String::new(),
        }));
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write a lease schedule as a single-sheet workbook in the input format
///
/// Dates are written as ISO text so the file reads the same in any locale.
pub fn write_lease_xlsx<P: AsRef<Path>>(table: &LeaseTable, path: P) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SAMPLE_SHEET_NAME)?;

    for (col, name) in header_row(table).iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name.as_str(), &header)?;
    }

    for (i, lease) in table.records.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, lease.tenant.as_str())?;
        sheet.write_string(row, 1, lease.lease_start.to_string())?;
        sheet.write_string(row, 2, lease.lease_end.to_string())?;
        sheet.write_number(row, 3, lease.market_rent)?;
        for (j, year) in table.rent_years.iter().enumerate() {
            if let Some(amount) = lease.passing_rents.get(year) {
                sheet.write_number(row, (4 + j) as u16, *amount)?;
            }
        }
    }

    sheet.set_column_width(0, 16)?;
    sheet.set_column_width(3, 22)?;

    workbook.save(path.as_ref())?;
    Ok(())
}

/// Write the sample schedule, choosing CSV or XLSX from the extension
pub fn write_sample<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let table = sample_lease_table();

    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("xlsx") => write_lease_xlsx(&table, path)?,
        Some("csv") => write_lease_csv(&table, std::fs::File::create(path)?)?,
        _ => {
            return Err(crate::error::ProjectionError::UnsupportedFormat(
                path.display().to_string(),
            ))
        }
    }

    info!("Sample lease schedule written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lease::{load_leases, load_leases_from_reader, load_leases_from_sheet};

    #[test]
    fn test_sample_shape() {
        let table = sample_lease_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rent_years, SAMPLE_YEARS.to_vec());
        assert_eq!(table.records[0].passing_rent(2026), 106_000.0);
        assert_eq!(table.records[1].market_rent, 140_000.0);
    }

    #[test]
    fn test_sample_csv_reloads() {
        let mut buffer = Vec::new();
        write_lease_csv(&sample_lease_table(), &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("Tenant,Lease Start,Lease End,Market Rent (AED/year),Passing Rent 2023"));

        let reloaded = load_leases_from_reader(text.as_bytes()).unwrap();
        assert_eq!(reloaded, sample_lease_table());
    }

    #[test]
    fn test_sample_xlsx_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample_lease_data.xlsx");
        write_sample(&path).unwrap();

        let reloaded = load_leases_from_sheet(&path, Some(SAMPLE_SHEET_NAME)).unwrap();
        assert_eq!(reloaded, sample_lease_table());

        let by_extension = load_leases(&path).unwrap();
        assert_eq!(by_extension.len(), 2);
    }

    #[test]
    fn test_sample_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_sample(dir.path().join("sample.pdf")).is_err());
    }
}
