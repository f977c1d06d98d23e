//! Lease Cash Flow - term and reversion rent projections for multi-tenant property
//!
//! This library provides:
//! - Lease schedule loading from CSV and Excel/ODS workbooks
//! - Per-tenant, per-year projection of passing rent, reversion to market rent
//!   and not-yet-commenced leases over a window starting at a valuation date
//! - CSV, XLSX and JSON output of the projected cash flows
//! - Parallel batch projections across a portfolio of properties

pub mod error;
pub mod lease;
pub mod projection;
pub mod output;
pub mod portfolio;

// Re-export commonly used types
pub use error::{ProjectionError, Result};
pub use lease::{LeaseRecord, LeaseTable, load_leases};
pub use projection::{CashFlowProjector, CashFlowRow, CashFlowTable, ProjectionConfig, ProjectionWindow, project_leases};
pub use portfolio::PortfolioRunner;
