//! Per-document status log.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::invoice::ParseOutcome;

/// One status log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub source_file: String,
    /// `success` or `failure`.
    pub outcome: String,
    pub invoice_id: Option<String>,
    pub line_items: usize,
    pub backend: Option<String>,
    pub note: String,
}

impl From<&ParseOutcome> for StatusEntry {
    fn from(outcome: &ParseOutcome) -> Self {
        let (label, line_items, backend) = match outcome {
            ParseOutcome::Success(parsed) => {
                ("success", parsed.line_items.len(), Some(parsed.backend.clone()))
            }
            ParseOutcome::Failure(_) => ("failure", 0, None),
        };
        Self {
            source_file: outcome.source_file().to_string(),
            outcome: label.to_string(),
            invoice_id: outcome.invoice_id().map(str::to_string),
            line_items,
            backend,
            note: outcome.note(),
        }
    }
}

/// Write one entry per outcome.
pub fn write_status<W: Write>(writer: W, outcomes: &[ParseOutcome]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if outcomes.is_empty() {
        wtr.write_record([
            "source_file",
            "outcome",
            "invoice_id",
            "line_items",
            "backend",
            "note",
        ])?;
    }
    for outcome in outcomes {
        wtr.serialize(StatusEntry::from(outcome))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_status_log(path: &Path, outcomes: &[ParseOutcome]) -> Result<()> {
    write_status(std::fs::File::create(path)?, outcomes)
}
