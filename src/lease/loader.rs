//! Load lease schedules from CSV files and spreadsheets

use super::{LeaseRecord, LeaseTable};
use crate::error::{ProjectionError, Result};
use calamine::{Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{debug, info};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

pub const TENANT_COLUMN: &str = "Tenant";
pub const LEASE_START_COLUMN: &str = "Lease Start";
pub const LEASE_END_COLUMN: &str = "Lease End";
pub const MARKET_RENT_COLUMN: &str = "Market Rent (AED/year)";
pub const PASSING_RENT_PREFIX: &str = "Passing Rent ";

/// Last serial day Excel can represent (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Serial Excel assigns to the non-existent 1900-02-29
const PHANTOM_LEAP_DAY: i64 = 60;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A cell as read from the file, before it is typed against its column
#[derive(Debug, Clone, PartialEq)]
enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl RawCell {
    fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(text.to_string())
        }
    }

    fn from_sheet(cell: &Data) -> Self {
        match cell {
            Data::Empty => RawCell::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::from_text(s),
            Data::Float(f) => RawCell::Number(*f),
            Data::Int(i) => RawCell::Number(*i as f64),
            Data::Bool(b) => RawCell::Text(b.to_string()),
            Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
                Some(date) => RawCell::Date(date),
                None => RawCell::Number(dt.as_f64()),
            },
            Data::Error(e) => RawCell::Text(e.to_string()),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }

    fn display(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.clone(),
            RawCell::Number(n) => n.to_string(),
            RawCell::Date(d) => d.to_string(),
        }
    }
}

/// Convert an Excel serial day number (1900 date system) to a date
///
/// The time-of-day fraction is dropped.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let day = serial.floor() as i64;
    // Excel counts a phantom 1900-02-29 as day 60, shifting every later day by one
    let base = match day {
        PHANTOM_LEAP_DAY => return None,
        d if d < PHANTOM_LEAP_DAY => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        _ => NaiveDate::from_ymd_opt(1899, 12, 30)?,
    };
    base.checked_add_signed(Duration::days(day))
}

/// Parse a date written as text in one of the accepted layouts
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Extract the year from a "Passing Rent <year>" header
///
/// Returns `Ok(None)` for headers that are not passing-rent columns.
pub fn parse_rent_year(header: &str) -> Result<Option<i32>> {
    if !header.starts_with(PASSING_RENT_PREFIX) {
        return Ok(None);
    }
    header
        .split_whitespace()
        .last()
        .and_then(|token| token.parse::<i32>().ok())
        .map(Some)
        .ok_or_else(|| ProjectionError::InvalidRentColumn(header.to_string()))
}

/// Column positions resolved from the header row
#[derive(Debug)]
struct ColumnLayout {
    tenant: usize,
    lease_start: usize,
    lease_end: usize,
    market_rent: usize,
    /// (year, column index, header text)
    passing_rents: Vec<(i32, usize, String)>,
}

impl ColumnLayout {
    fn from_headers(headers: &[String]) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ProjectionError::MissingColumn(name.to_string()))
        };

        let mut passing_rents: Vec<(i32, usize, String)> = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(year) = parse_rent_year(header)? {
                if passing_rents.iter().any(|(y, _, _)| *y == year) {
                    return Err(ProjectionError::DuplicateRentYear(year));
                }
                passing_rents.push((year, idx, header.clone()));
            }
        }

        Ok(Self {
            tenant: find(TENANT_COLUMN)?,
            lease_start: find(LEASE_START_COLUMN)?,
            lease_end: find(LEASE_END_COLUMN)?,
            market_rent: find(MARKET_RENT_COLUMN)?,
            passing_rents,
        })
    }

    fn rent_years(&self) -> Vec<i32> {
        self.passing_rents.iter().map(|(year, _, _)| *year).collect()
    }
}

fn cell_at(cells: &[RawCell], idx: usize) -> &RawCell {
    const EMPTY: &RawCell = &RawCell::Empty;
    cells.get(idx).unwrap_or(EMPTY)
}

fn parse_tenant(cell: &RawCell, row: usize) -> Result<String> {
    match cell {
        RawCell::Empty => Err(ProjectionError::MissingValue {
            row,
            column: TENANT_COLUMN.to_string(),
        }),
        // Spreadsheets store numeric tenant codes as floats
        RawCell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Ok(format!("{}", *n as i64)),
        other => Ok(other.display()),
    }
}

fn parse_date(cell: &RawCell, row: usize, column: &str) -> Result<NaiveDate> {
    let parsed = match cell {
        RawCell::Empty => {
            return Err(ProjectionError::MissingValue {
                row,
                column: column.to_string(),
            })
        }
        RawCell::Date(date) => Some(*date),
        RawCell::Number(serial) => excel_serial_to_date(*serial),
        RawCell::Text(text) => parse_date_text(text),
    };

    parsed.ok_or_else(|| ProjectionError::InvalidDate {
        row,
        column: column.to_string(),
        value: cell.display(),
    })
}

/// Parse a non-negative amount; blank cells yield `None`
fn parse_amount(cell: &RawCell, row: usize, column: &str) -> Result<Option<f64>> {
    let invalid = || ProjectionError::InvalidAmount {
        row,
        column: column.to_string(),
        value: cell.display(),
    };

    let amount = match cell {
        RawCell::Empty => return Ok(None),
        RawCell::Number(n) => *n,
        RawCell::Text(text) => text.replace(',', "").parse::<f64>().map_err(|_| invalid())?,
        RawCell::Date(_) => return Err(invalid()),
    };

    if !amount.is_finite() || amount < 0.0 {
        return Err(invalid());
    }
    Ok(Some(amount))
}

fn parse_record(cells: &[RawCell], layout: &ColumnLayout, row: usize) -> Result<LeaseRecord> {
    let tenant = parse_tenant(cell_at(cells, layout.tenant), row)?;
    let lease_start = parse_date(cell_at(cells, layout.lease_start), row, LEASE_START_COLUMN)?;
    let lease_end = parse_date(cell_at(cells, layout.lease_end), row, LEASE_END_COLUMN)?;
    let market_rent = parse_amount(cell_at(cells, layout.market_rent), row, MARKET_RENT_COLUMN)?
        .ok_or_else(|| ProjectionError::MissingValue {
            row,
            column: MARKET_RENT_COLUMN.to_string(),
        })?;

    let mut record = LeaseRecord::new(tenant, lease_start, lease_end, market_rent);
    for (year, idx, header) in &layout.passing_rents {
        if let Some(amount) = parse_amount(cell_at(cells, *idx), row, header)? {
            record.passing_rents.insert(*year, amount);
        }
    }

    Ok(record)
}

/// Type every data row against the header row
///
/// `first_row` is the spreadsheet row number of the first data row.
fn build_table(headers: &[String], rows: Vec<Vec<RawCell>>, first_row: usize) -> Result<LeaseTable> {
    let layout = ColumnLayout::from_headers(headers)?;
    debug!(
        "Resolved {} passing rent columns: {:?}",
        layout.passing_rents.len(),
        layout.rent_years()
    );

    let mut records = Vec::with_capacity(rows.len());
    for (i, cells) in rows.iter().enumerate() {
        let row = first_row + i;
        if cells.iter().all(RawCell::is_empty) {
            debug!("Skipping blank row {}", row);
            continue;
        }
        records.push(parse_record(cells, &layout, row)?);
    }

    Ok(LeaseTable::new(records, layout.rent_years()))
}

/// Load a lease schedule from CSV text in any reader
pub fn load_leases_from_reader<R: std::io::Read>(reader: R) -> Result<LeaseTable> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        rows.push(record.iter().map(RawCell::from_text).collect());
    }

    build_table(&headers, rows, 2)
}

/// Extensions read as CSV text
pub const CSV_EXTENSIONS: [&str; 1] = ["csv"];

/// Extensions read as Excel/ODS workbooks
pub const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// True if `load_leases` knows how to read `path`
pub fn is_lease_file(path: &Path) -> bool {
    let extension = extension_of(path);
    CSV_EXTENSIONS.contains(&extension.as_str()) || WORKBOOK_EXTENSIONS.contains(&extension.as_str())
}

fn read_workbook<RS>(mut workbook: calamine::Sheets<RS>, sheet: Option<&str>) -> Result<LeaseTable>
where
    RS: std::io::Read + std::io::Seek,
{
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ProjectionError::Spreadsheet("workbook has no worksheets".to_string()))?,
    };
    debug!("Reading worksheet '{}'", sheet_name);

    let range = workbook.worksheet_range(&sheet_name)?;
    // Ranges start at the first used cell, which need not be A1
    let header_row = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .map(|cells| cells.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    let rows = sheet_rows
        .map(|cells| cells.iter().map(RawCell::from_sheet).collect())
        .collect();

    build_table(&headers, rows, header_row + 1)
}

/// Load a lease schedule from a worksheet of an Excel/ODS workbook
///
/// With no sheet name the first worksheet is used.
pub fn load_leases_from_sheet<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<LeaseTable> {
    read_workbook(calamine::open_workbook_auto(path.as_ref())?, sheet)
}

/// Load a lease schedule from workbook bytes held in memory (e.g. an upload)
pub fn load_leases_from_workbook_bytes(bytes: &[u8], sheet: Option<&str>) -> Result<LeaseTable> {
    let workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    read_workbook(workbook, sheet)
}

/// Load a lease schedule, choosing the reader from the file extension
pub fn load_leases<P: AsRef<Path>>(path: P) -> Result<LeaseTable> {
    let path = path.as_ref();
    let extension = extension_of(path);

    let table = if CSV_EXTENSIONS.contains(&extension.as_str()) {
        load_leases_from_reader(File::open(path)?)?
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        load_leases_from_sheet(path, None)?
    } else {
        return Err(ProjectionError::UnsupportedFormat(path.display().to_string()));
    };

    info!(
        "Loaded {} leases with {} passing rent columns from {}",
        table.len(),
        table.rent_years.len(),
        path.display()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Tenant,Lease Start,Lease End,Market Rent (AED/year),Passing Rent 2023,Passing Rent 2024";

    fn load(body: &str) -> Result<LeaseTable> {
        load_leases_from_reader(format!("{}\n{}", HEADER, body).as_bytes())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_load_csv_schedule() {
        let table = load("Tenant A,2023-01-01,2027-12-31,120000,100000,102000\n\
                          Tenant B,2024-06-01,2029-05-31,140000,0,120000")
            .expect("schedule should load");

        assert_eq!(table.rent_years, vec![2023, 2024]);
        assert_eq!(table.len(), 2);

        let a = &table.records[0];
        assert_eq!(a.tenant, "Tenant A");
        assert_eq!(a.lease_start, date(2023, 1, 1));
        assert_eq!(a.lease_end, date(2027, 12, 31));
        assert_eq!(a.market_rent, 120_000.0);
        assert_eq!(a.passing_rent(2024), 102_000.0);

        assert_eq!(table.records[1].passing_rent(2023), 0.0);
    }

    #[test]
    fn test_load_bundled_sample() {
        let table = load_leases("data/sample_lease_data.csv").expect("Failed to load sample leases");
        assert_eq!(table, crate::lease::sample_lease_table());
    }

    #[test]
    fn test_blank_passing_rent_is_absent() {
        let table = load("Tenant A,2023-01-01,2027-12-31,120000,,102000").unwrap();
        assert!(!table.records[0].passing_rents.contains_key(&2023));
        assert_eq!(table.records[0].passing_rent(2023), 0.0);
    }

    #[test]
    fn test_missing_required_column() {
        let err = load_leases_from_reader("Tenant,Lease Start,Lease End\nA,2023-01-01,2024-01-01".as_bytes())
            .unwrap_err();
        assert!(matches!(err, ProjectionError::MissingColumn(ref c) if c == MARKET_RENT_COLUMN));
    }

    #[test]
    fn test_invalid_date_aborts_with_row() {
        let err = load("Tenant A,2023-01-01,2027-12-31,120000,1,1\n\
                        Tenant B,next spring,2029-05-31,140000,1,1")
            .unwrap_err();
        match err {
            ProjectionError::InvalidDate { row, column, value } => {
                assert_eq!(row, 3);
                assert_eq!(column, LEASE_START_COLUMN);
                assert_eq!(value, "next spring");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_market_rent_is_an_error() {
        let err = load("Tenant A,2023-01-01,2027-12-31,,1,1").unwrap_err();
        assert!(matches!(err, ProjectionError::MissingValue { row: 2, .. }));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let err = load("Tenant A,2023-01-01,2027-12-31,120000,-5,1").unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidAmount { ref column, .. } if column == "Passing Rent 2023"));
    }

    #[test]
    fn test_thousands_separators_accepted() {
        let table = load("Tenant A,2023-01-01,2027-12-31,\"120,000.50\",\"100,000\",1").unwrap();
        assert_eq!(table.records[0].market_rent, 120_000.5);
        assert_eq!(table.records[0].passing_rent(2023), 100_000.0);
    }

    #[test]
    fn test_blank_rows_skipped() {
        let table = load("Tenant A,2023-01-01,2027-12-31,120000,1,1\n,,,,,\n").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_bad_rent_column_header() {
        let err = load_leases_from_reader(
            "Tenant,Lease Start,Lease End,Market Rent (AED/year),Passing Rent FY23\n".as_bytes(),
        )
        .unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidRentColumn(_)));
    }

    #[test]
    fn test_duplicate_rent_year() {
        let err = load_leases_from_reader(
            "Tenant,Lease Start,Lease End,Market Rent (AED/year),Passing Rent 2023,Passing Rent  2023\n"
                .as_bytes(),
        )
        .unwrap_err();
        assert!(matches!(err, ProjectionError::DuplicateRentYear(2023)));
    }

    #[test]
    fn test_parse_rent_year() {
        assert_eq!(parse_rent_year("Passing Rent 2031").unwrap(), Some(2031));
        assert_eq!(parse_rent_year("Market Rent (AED/year)").unwrap(), None);
        assert!(parse_rent_year("Passing Rent ").is_err());
    }

    #[test]
    fn test_date_layouts() {
        assert_eq!(parse_date_text("2024-06-01"), Some(date(2024, 6, 1)));
        assert_eq!(parse_date_text("2024/06/01"), Some(date(2024, 6, 1)));
        assert_eq!(parse_date_text("01/06/2024"), Some(date(2024, 6, 1)));
        assert_eq!(parse_date_text("2024-06-01 00:00:00"), Some(date(2024, 6, 1)));
        assert_eq!(parse_date_text("2024-06-01T13:45:00"), Some(date(2024, 6, 1)));
        assert_eq!(parse_date_text("June 2024"), None);
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(44927.0), Some(date(2023, 1, 1)));
        assert_eq!(excel_serial_to_date(44927.75), Some(date(2023, 1, 1)));
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn test_excel_serial_before_march_1900() {
        assert_eq!(excel_serial_to_date(1.0), Some(date(1900, 1, 1)));
        assert_eq!(excel_serial_to_date(59.0), Some(date(1900, 2, 28)));
        assert_eq!(excel_serial_to_date(60.0), None);
        assert_eq!(excel_serial_to_date(61.0), Some(date(1900, 3, 1)));
    }

    #[test]
    fn test_numeric_tenant_rendered_as_text() {
        assert_eq!(parse_tenant(&RawCell::Number(1042.0), 2).unwrap(), "1042");
        assert_eq!(parse_tenant(&RawCell::Text("Unit 7".into()), 2).unwrap(), "Unit 7");
        assert!(parse_tenant(&RawCell::Empty, 2).is_err());
    }

    #[test]
    fn test_lease_file_extensions() {
        assert!(is_lease_file(Path::new("tower.csv")));
        assert!(is_lease_file(Path::new("tower.XLSB")));
        assert!(is_lease_file(Path::new("tower.ods")));
        assert!(!is_lease_file(Path::new("tower.txt")));
        assert!(!is_lease_file(Path::new("tower")));
    }

    #[test]
    fn test_load_workbook_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leases.xlsx");
        crate::lease::write_sample(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let table = load_leases_from_workbook_bytes(&bytes, None).unwrap();
        assert_eq!(table, crate::lease::sample_lease_table());

        assert!(load_leases_from_workbook_bytes(b"not a workbook", None).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_leases("leases.txt").unwrap_err();
        assert!(matches!(err, ProjectionError::UnsupportedFormat(_)));
    }
}
