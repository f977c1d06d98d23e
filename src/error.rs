//! Error types for lease loading, projection and output

use thiserror::Error;

/// Everything that can abort a load, projection or write
///
/// Row numbers are spreadsheet row numbers (the header is row 1).
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("failed to write spreadsheet: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: missing value for '{column}'")]
    MissingValue { row: usize, column: String },

    #[error("row {row}: invalid date '{value}' in column '{column}'")]
    InvalidDate {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: invalid amount '{value}' in column '{column}'")]
    InvalidAmount {
        row: usize,
        column: String,
        value: String,
    },

    #[error("passing rent column '{0}' does not end in a year")]
    InvalidRentColumn(String),

    #[error("passing rent for {0} appears in more than one column")]
    DuplicateRentYear(i32),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("{name}: {source}")]
    Property {
        name: String,
        #[source]
        source: Box<ProjectionError>,
    },
}

impl ProjectionError {
    /// Tag an error with the property (lease file) it came from
    pub fn for_property(self, name: impl Into<String>) -> Self {
        ProjectionError::Property {
            name: name.into(),
            source: Box::new(self),
        }
    }
}

impl From<calamine::Error> for ProjectionError {
    fn from(err: calamine::Error) -> Self {
        ProjectionError::Spreadsheet(err.to_string())
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ProjectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_row_and_column() {
        let err = ProjectionError::InvalidDate {
            row: 3,
            column: "Lease End".to_string(),
            value: "soon".to_string(),
        };
        assert_eq!(err.to_string(), "row 3: invalid date 'soon' in column 'Lease End'");

        let err = ProjectionError::MissingColumn("Tenant".to_string());
        assert_eq!(err.to_string(), "missing required column 'Tenant'");
    }
}
