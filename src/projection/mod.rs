//! Projection engine for term and reversion rent cash flows

mod window;
mod engine;
mod cashflows;

pub use window::{ProjectionWindow, DEFAULT_HORIZON_YEARS};
pub use engine::{CashFlowProjector, ProjectionConfig, project_leases, rent_for_year};
pub use cashflows::{
    CashFlowCell, CashFlowRow, CashFlowTable, ProjectionSummary, RentBasis, round_to_cents,
};
