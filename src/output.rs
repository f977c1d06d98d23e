//! Writers for projected cash-flow tables
//!
//! CSV and XLSX carry the `Tenant, <year>...` layout; JSON carries the full
//! table including the valuation date and, for detailed runs, each cell's basis.

use crate::error::{ProjectionError, Result};
use crate::lease::loader::TENANT_COLUMN;
use crate::projection::CashFlowTable;
use log::info;
use rust_xlsxwriter::{Format, Workbook};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

pub const CASH_FLOW_SHEET_NAME: &str = "Cash Flow";

/// Supported output file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Xlsx,
    Json,
}

impl OutputFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for OutputFormat {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" => Ok(OutputFormat::Xlsx),
            "json" => Ok(OutputFormat::Json),
            other => Err(ProjectionError::UnsupportedFormat(other.to_string())),
        }
    }
}

fn header_row(table: &CashFlowTable) -> Vec<String> {
    std::iter::once(TENANT_COLUMN.to_string())
        .chain(table.years.iter().map(|y| y.to_string()))
        .collect()
}

/// Write the table as CSV with amounts to 2 decimals
pub fn write_csv<W: Write>(table: &CashFlowTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header_row(table))?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(row.cells.len() + 1);
        record.push(row.tenant.clone());
        record.extend(row.cells.iter().map(|c| format!("{:.2}", c.amount)));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Build the XLSX workbook in memory
pub fn xlsx_bytes(table: &CashFlowTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let amount = Format::new().set_num_format("#,##0.00");

    let sheet = workbook.add_worksheet();
    sheet.set_name(CASH_FLOW_SHEET_NAME)?;

    for (col, name) in header_row(table).iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name.as_str(), &header)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, row.tenant.as_str())?;
        for (j, cell) in row.cells.iter().enumerate() {
            sheet.write_number_with_format(r, (j + 1) as u16, cell.amount, &amount)?;
        }
    }

    sheet.set_column_width(0, 20)?;
    for col in 1..=table.years.len() {
        sheet.set_column_width(col as u16, 14)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write the table as pretty-printed JSON
pub fn write_json<W: Write>(table: &CashFlowTable, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, table)?;
    Ok(())
}

/// Write the table to `path`, inferring the format from the extension when not given
pub fn write_table(table: &CashFlowTable, path: &Path, format: Option<OutputFormat>) -> Result<()> {
    let format = format
        .or_else(|| OutputFormat::from_path(path))
        .ok_or_else(|| ProjectionError::UnsupportedFormat(path.display().to_string()))?;

    match format {
        OutputFormat::Csv => write_csv(table, File::create(path)?)?,
        OutputFormat::Json => write_json(table, File::create(path)?)?,
        OutputFormat::Xlsx => std::fs::write(path, xlsx_bytes(table)?)?,
    }

    info!(
        "Cash flow for {} tenants over {} years written to {}",
        table.rows.len(),
        table.years.len(),
        path.display()
    );
    Ok(())
}

/// Render the table as fixed-width text for the console
pub fn format_table(table: &CashFlowTable) -> String {
    let tenant_width = table
        .rows
        .iter()
        .map(|r| r.tenant.chars().count())
        .chain(std::iter::once(TENANT_COLUMN.len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!("{:<width$}", TENANT_COLUMN, width = tenant_width));
    for year in &table.years {
        out.push_str(&format!(" {:>14}", year));
    }
    out.push('\n');
    out.push_str(&"-".repeat(tenant_width + 15 * table.years.len()));
    out.push('\n');

    for row in &table.rows {
        out.push_str(&format!("{:<width$}", row.tenant, width = tenant_width));
        for cell in &row.cells {
            out.push_str(&format!(" {:>14.2}", cell.amount));
        }
        out.push('\n');
    }

    out
}
