use std::str::FromStr;

use emociograma_core::{AppError, AppResult};

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// JSON array of objects keyed by column name.
    Json,
}

impl ExportFormat {
    /// Returns the file extension.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Returns the MIME content type.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(AppError::Validation(format!(
                "unsupported export format '{other}'"
            ))),
        }
    }
}

/// Flat tabular data handed to a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    /// Column names in output order.
    pub columns: Vec<&'static str>,
    /// Rows; each row has one value per column.
    pub rows: Vec<Vec<String>>,
}

/// Rendered export ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    /// Suggested file name.
    pub file_name: String,
    /// MIME content type.
    pub content_type: &'static str,
    /// Rendered bytes.
    pub bytes: Vec<u8>,
}

/// Stateless renderer turning flat records into a file format.
pub trait ExportRenderer: Send + Sync {
    /// Renders the table in the requested format.
    fn render(&self, format: ExportFormat, table: &ExportTable) -> AppResult<Vec<u8>>;
}
