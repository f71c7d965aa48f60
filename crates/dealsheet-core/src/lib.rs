//! Core library for vendor deal invoices.
//!
//! This crate provides:
//! - PDF text extraction with a layout backend and a plain-text fallback
//! - Invoice field location and line item reconstruction
//! - Concurrent batch processing
//! - CSV/XLSX export and the per-file status log

pub mod batch;
pub mod error;
pub mod invoice;
pub mod models;
pub mod pdf;
pub mod sink;

pub use batch::{discover_inputs, BatchRunner};
pub use error::{DealsheetError, Diagnostic, ExtractionError, Result};
pub use invoice::{DealInvoiceParser, InvoiceParser};
pub use models::config::DealsheetConfig;
pub use models::invoice::{
    Field, InvoiceRecord, InvoiceStatus, LineItemRecord, ParseFailure, ParseOutcome, ParsedInvoice,
};
pub use pdf::{FallbackExtractor, TextExtractor};
pub use sink::{InvoiceRow, OutputFormat};
