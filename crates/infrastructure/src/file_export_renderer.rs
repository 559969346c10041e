//! CSV and JSON rendering for manager exports.

use csv::{QuoteStyle, WriterBuilder};
use emociograma_application::{ExportFormat, ExportRenderer, ExportTable};
use emociograma_core::{AppError, AppResult};
use serde_json::{Map, Value};

/// Renders export tables with `csv` and `serde_json`.
#[derive(Clone, Copy, Default)]
pub struct FileExportRenderer;

impl FileExportRenderer {
    /// Creates a new renderer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn render_csv(table: &ExportTable) -> AppResult<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer
        .write_record(&table.columns)
        .map_err(|error| AppError::Internal(format!("failed to write csv header: {error}")))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|error| AppError::Internal(format!("failed to write csv row: {error}")))?;
    }

    writer
        .into_inner()
        .map_err(|error| AppError::Internal(format!("failed to flush csv export: {error}")))
}

fn render_json(table: &ExportTable) -> AppResult<Vec<u8>> {
    let records: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            let record: Map<String, Value> = table
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| ((*column).to_owned(), Value::String(value.clone())))
                .collect();
            Value::Object(record)
        })
        .collect();

    serde_json::to_vec_pretty(&records)
        .map_err(|error| AppError::Internal(format!("failed to serialize json export: {error}")))
}

impl ExportRenderer for FileExportRenderer {
    fn render(&self, format: ExportFormat, table: &ExportTable) -> AppResult<Vec<u8>> {
        if let Some(row) = table.rows.iter().find(|row| row.len() != table.columns.len()) {
            return Err(AppError::Internal(format!(
                "export row has {} values for {} columns",
                row.len(),
                table.columns.len()
            )));
        }

        match format {
            ExportFormat::Csv => render_csv(table),
            ExportFormat::Json => render_json(table),
        }
    }
}
