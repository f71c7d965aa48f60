//! Result sink: the flattened invoice table and the status log.

pub mod delimited;
pub mod spreadsheet;
pub mod status;
pub mod table;

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::models::invoice::ParseOutcome;

pub use status::{write_status_log, StatusEntry};
pub use table::{table_rows, InvoiceRow, COLUMNS};

/// Table file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Xlsx,
}

impl OutputFormat {
    /// `.xlsx` selects XLSX, anything else CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => OutputFormat::Xlsx,
            _ => OutputFormat::Csv,
        }
    }
}

/// Write the invoice table for `outcomes` to `path`. Returns the row count.
pub fn write_table(path: &Path, outcomes: &[ParseOutcome]) -> Result<usize> {
    let rows = table_rows(outcomes);
    let format = OutputFormat::from_path(path);
    match format {
        OutputFormat::Csv => delimited::write_csv(path, &rows)?,
        OutputFormat::Xlsx => spreadsheet::write_xlsx(path, &rows)?,
    }
    info!("Wrote {} row(s) to {} as {:?}", rows.len(), path.display(), format);
    Ok(rows.len())
}
