//! AWS Lambda handler for lease cash-flow projections
//!
//! Accepts a lease schedule (CSV text or a base64 workbook) and a valuation
//! date via JSON and returns the projected term and reversion cash flow per
//! tenant, either as JSON or as an XLSX download.
//!
//! Supports Lambda Function URLs for direct HTTP access.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use lease_cashflow::{
    lease::{load_leases_from_reader, load_leases_from_workbook_bytes, LeaseTable},
    output::xlsx_bytes,
    projection::{CashFlowProjector, CashFlowRow, ProjectionConfig, DEFAULT_HORIZON_YEARS},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Input for the projection
#[derive(Debug, Deserialize)]
pub struct ProjectionRequest {
    /// Valuation date (YYYY-MM-DD)
    pub valuation_date: NaiveDate,

    /// Lease schedule in the CSV input format, header row included
    #[serde(default)]
    pub leases_csv: Option<String>,

    /// Lease schedule as a base64-encoded workbook (xlsx, xlsb, xls, ods)
    #[serde(default)]
    pub leases_xlsx: Option<String>,

    /// Worksheet to read from `leases_xlsx` (default: first sheet)
    #[serde(default)]
    pub sheet: Option<String>,

    /// Years to project (default: 10)
    #[serde(default = "default_horizon_years")]
    pub horizon_years: u32,

    /// Include each cell's rent basis
    #[serde(default)]
    pub detailed: bool,

    /// "json" (default) or "xlsx"
    #[serde(default)]
    pub response_format: ResponseFormat,
}

fn default_horizon_years() -> u32 { DEFAULT_HORIZON_YEARS }

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Json,
    Xlsx,
}

const JSON_CONTENT_TYPE: &str = "application/json";
const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLSX_FILE_NAME: &str = "10_year_cash_flow.xlsx";

/// Output from the projection
#[derive(Debug, Serialize)]
pub struct ProjectionResponse {
    pub valuation_date: NaiveDate,
    pub years: Vec<i32>,
    pub rows: Vec<CashFlowRow>,
    pub totals: Vec<YearTotal>,
    pub tenant_count: usize,
    pub total_rent: f64,
    pub execution_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub total: f64,
}

fn cors_builder(status: u16, content_type: &str) -> lambda_http::http::response::Builder {
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
}

fn error_response(status: u16, message: &str) -> Result<Response<Body>, Error> {
    let body = serde_json::json!({ "error": message }).to_string();
    Ok(cors_builder(status, JSON_CONTENT_TYPE).body(Body::Text(body))?)
}

fn json_response(body: &ProjectionResponse) -> Result<Response<Body>, Error> {
    Ok(cors_builder(200, JSON_CONTENT_TYPE).body(Body::Text(serde_json::to_string(body)?))?)
}

fn xlsx_response(bytes: Vec<u8>) -> Result<Response<Body>, Error> {
    Ok(cors_builder(200, XLSX_CONTENT_TYPE)
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", XLSX_FILE_NAME),
        )
        .body(Body::Binary(bytes))?)
}

/// Read the lease schedule from whichever input field the request carries
fn load_request_leases(request: &ProjectionRequest) -> Result<LeaseTable, String> {
    match (&request.leases_csv, &request.leases_xlsx) {
        (Some(csv), None) => load_leases_from_reader(csv.as_bytes()).map_err(|e| e.to_string()),
        (None, Some(encoded)) => {
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|e| format!("Invalid base64 in leases_xlsx: {}", e))?;
            load_leases_from_workbook_bytes(&bytes, request.sheet.as_deref())
                .map_err(|e| e.to_string())
        }
        (Some(_), Some(_)) => Err("Send either leases_csv or leases_xlsx, not both".to_string()),
        (None, None) => Err("Missing lease schedule: send leases_csv or leases_xlsx".to_string()),
    }
}

/// Lambda handler function
async fn handler(event: Request) -> Result<Response<Body>, Error> {
    let start = std::time::Instant::now();

    // Handle CORS preflight
    if event.method().as_str() == "OPTIONS" {
        return Ok(cors_builder(200, JSON_CONTENT_TYPE).body(Body::Empty)?);
    }

    let body_str = match event.body() {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => "{}".to_string(),
    };

    let request: ProjectionRequest = match serde_json::from_str(&body_str) {
        Ok(r) => r,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };

    let leases = match load_request_leases(&request) {
        Ok(table) => table,
        Err(e) => {
            warn!("Rejected lease schedule: {}", e);
            return error_response(400, &e);
        }
    };

    let projector = CashFlowProjector::new(ProjectionConfig {
        horizon_years: request.horizon_years,
        detailed_output: request.detailed,
    });
    let cash_flow = match projector.project(&leases, request.valuation_date) {
        Ok(table) => table,
        Err(e) => return error_response(400, &e.to_string()),
    };

    if request.response_format == ResponseFormat::Xlsx {
        let bytes = match xlsx_bytes(&cash_flow) {
            Ok(bytes) => bytes,
            Err(e) => return error_response(500, &e.to_string()),
        };
        info!(
            "Projected {} tenants to a {} byte workbook in {} ms",
            cash_flow.rows.len(),
            bytes.len(),
            start.elapsed().as_millis()
        );
        return xlsx_response(bytes);
    }

    let summary = cash_flow.summary();
    let totals = cash_flow
        .year_totals()
        .into_iter()
        .map(|(year, total)| YearTotal { year, total })
        .collect();

    let response = ProjectionResponse {
        valuation_date: cash_flow.valuation_date,
        years: cash_flow.years,
        rows: cash_flow.rows,
        totals,
        tenant_count: summary.tenant_count,
        total_rent: summary.total_rent,
        execution_time_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Projected {} tenants over {} years in {} ms",
        response.tenant_count,
        response.years.len(),
        response.execution_time_ms
    );

    json_response(&response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use lease_cashflow::lease::{sample_lease_table, write_sample};

    fn request(body: serde_json::Value) -> ProjectionRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_csv_request_defaults() {
        let req = request(serde_json::json!({
            "valuation_date": "2023-01-01",
            "leases_csv": "Tenant,Lease Start,Lease End,Market Rent (AED/year),Passing Rent 2023\n\
                           Shop 1,2020-01-01,2025-12-31,50000,40000\n",
        }));
        assert_eq!(req.horizon_years, DEFAULT_HORIZON_YEARS);
        assert_eq!(req.response_format, ResponseFormat::Json);

        let table = load_request_leases(&req).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].passing_rent(2023), 40_000.0);
    }

    #[test]
    fn test_base64_workbook_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leases.xlsx");
        write_sample(&path).unwrap();
        let encoded = STANDARD.encode(std::fs::read(&path).unwrap());

        let req = request(serde_json::json!({
            "valuation_date": "2023-01-01",
            "leases_xlsx": encoded,
            "response_format": "xlsx",
        }));
        assert_eq!(req.response_format, ResponseFormat::Xlsx);
        assert_eq!(load_request_leases(&req).unwrap(), sample_lease_table());
    }

    #[test]
    fn test_request_needs_exactly_one_schedule() {
        let neither = request(serde_json::json!({ "valuation_date": "2023-01-01" }));
        assert!(load_request_leases(&neither).unwrap_err().starts_with("Missing lease schedule"));

        let both = request(serde_json::json!({
            "valuation_date": "2023-01-01",
            "leases_csv": "",
            "leases_xlsx": "",
        }));
        assert!(load_request_leases(&both).is_err());

        let garbled = request(serde_json::json!({
            "valuation_date": "2023-01-01",
            "leases_xlsx": "not base64!",
        }));
        assert!(load_request_leases(&garbled).unwrap_err().contains("base64"));
    }
}
