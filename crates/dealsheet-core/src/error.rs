//! Error types for the dealsheet-core library.

use thiserror::Error;

use crate::models::invoice::Field;

/// Main error type for the dealsheet library.
#[derive(Error, Debug)]
pub enum DealsheetError {
    /// Text extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// XLSX serialization error.
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors that make a document unreadable.
///
/// Any of these turns the document into a failure outcome; the batch
/// carries on with the next file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and the empty password did not open it.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// A backend failed while decoding text.
    #[error("{backend} backend failed: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    /// Every backend produced empty output.
    #[error("no text could be extracted by any backend")]
    NoText,
}

/// Soft problems found while parsing one document.
///
/// None of these abort the document; they are attached to the outcome and
/// written into the status log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A field label was not found.
    #[error("missing {0}")]
    FieldMissing(Field),

    /// A field label was found but its value did not normalize.
    #[error("unparseable {field}: {raw:?}")]
    FieldUnparseable { field: Field, raw: String },

    /// Line item table anchors were missing or out of place.
    #[error("layout mismatch: {0}")]
    LayoutMismatch(String),

    /// Filename id and body id disagree; the body id is kept.
    #[error("identifier mismatch: filename has {filename_id}, body has {body_id}")]
    IdentifierMismatch {
        filename_id: String,
        body_id: String,
    },

    /// The body carried no id; the filename id was used instead.
    #[error("invoice id taken from filename ({0})")]
    IdentifierFromFilename(String),

    /// The primary backend output was incomplete and the fallback was used.
    #[error("fallback backend {backend} used: {reason}")]
    FallbackBackend {
        backend: &'static str,
        reason: String,
    },

    /// Amounts do not add up within tolerance.
    #[error("totals mismatch: {0}")]
    TotalsMismatch(String),
}

impl Diagnostic {
    /// Whether this diagnostic is a layout mismatch.
    pub fn is_layout_mismatch(&self) -> bool {
        matches!(self, Diagnostic::LayoutMismatch(_))
    }
}

/// Result type for the dealsheet library.
pub type Result<T> = std::result::Result<T, DealsheetError>;
