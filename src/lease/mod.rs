//! Lease records and schedule loading

mod data;
pub mod loader;
pub mod sample;

pub use data::{LeaseRecord, LeaseTable};
pub use loader::{
    is_lease_file, load_leases, load_leases_from_reader, load_leases_from_sheet,
    load_leases_from_workbook_bytes,
};
pub use sample::{sample_lease_table, write_sample};
