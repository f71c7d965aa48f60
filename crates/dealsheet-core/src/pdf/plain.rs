//! Plain text extraction using pdf-extract.

use tracing::debug;

use super::{load_document, ExtractedText, Result, TextExtractor};
use crate::error::ExtractionError;

const BACKEND: &str = "plain";

/// Fallback backend: reading-order text without positions.
pub struct PlainTextExtractor {
    try_empty_password: bool,
}

impl PlainTextExtractor {
    pub fn new(try_empty_password: bool) -> Self {
        Self { try_empty_password }
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn extract(&self, data: &[u8]) -> Result<ExtractedText> {
        let (_, decrypted) = load_document(data, self.try_empty_password)?;
        let bytes = decrypted.as_deref().unwrap_or(data);

        let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            ExtractionError::Backend {
                backend: BACKEND,
                message: e.to_string(),
            }
        })?;

        let extracted = ExtractedText::from_plain(BACKEND, &text);
        debug!("Plain backend extracted {} lines", extracted.lines.len());
        Ok(extracted)
    }
}
