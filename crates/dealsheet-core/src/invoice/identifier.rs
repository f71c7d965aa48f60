//! Cross-check of the invoice id against the source filename.

use std::path::Path;

use tracing::warn;

use super::rules::patterns::FILENAME_PREFIX;
use crate::error::Diagnostic;
use crate::models::invoice::InvoiceRecord;

/// Id encoded in a filename such as `invoice-1001.pdf`.
///
/// The stem is used with an optional `invoice-` / `invoice_` prefix removed.
pub fn filename_id(source_file: &str) -> Option<String> {
    let stem = Path::new(source_file).file_stem()?.to_str()?;
    let id = FILENAME_PREFIX.replace(stem, "");
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Compare body and filename ids.
///
/// A differing body id is kept and reported; an absent body id is replaced
/// by the filename id.
pub fn check_identifier(invoice: &mut InvoiceRecord, source_file: &str) -> Option<Diagnostic> {
    let from_filename = filename_id(source_file)?;

    match invoice.invoice_id.as_deref() {
        Some(body_id) if body_id.eq_ignore_ascii_case(&from_filename) => None,
        Some(body_id) => {
            warn!(
                "{}: filename id {} differs from body id {}",
                source_file, from_filename, body_id
            );
            Some(Diagnostic::IdentifierMismatch {
                filename_id: from_filename,
                body_id: body_id.to_string(),
            })
        }
        None => {
            invoice.invoice_id = Some(from_filename.clone());
            Some(Diagnostic::IdentifierFromFilename(from_filename))
        }
    }
}
