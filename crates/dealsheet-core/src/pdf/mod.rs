//! PDF text extraction.
//!
//! Two backends sit behind [`TextExtractor`]: a layout-aware one that
//! rebuilds lines from positioned glyphs and a plain text fallback.
//! [`FallbackExtractor`] runs the primary backend and only consults the
//! secondary one when the primary output fails the completeness check.

mod layout;
mod plain;

pub use layout::LayoutExtractor;
pub use plain::PlainTextExtractor;

use std::collections::HashSet;

use lopdf::{Document, ObjectId};
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::models::config::PdfConfig;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// One line of extracted text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Line text, with runs of two or more spaces marking column gaps.
    pub text: String,
    /// Page number (1-indexed).
    pub page: u32,
    /// Baseline position in page space, when the backend knows it.
    pub y: Option<f32>,
}

/// Ordered text lines produced by one backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    /// Name of the backend that produced the lines.
    pub backend: &'static str,
    /// Lines in reading order, pages in order.
    pub lines: Vec<TextLine>,
}

impl ExtractedText {
    /// Split plain text into lines; form feeds advance the page counter.
    pub fn from_plain(backend: &'static str, text: &str) -> Self {
        let mut lines = Vec::new();
        for (index, page) in text.split('\u{c}').enumerate() {
            for line in page.lines() {
                let line = line.trim_end();
                if line.trim().is_empty() {
                    continue;
                }
                lines.push(TextLine {
                    text: line.to_string(),
                    page: index as u32 + 1,
                    y: None,
                });
            }
        }
        Self { backend, lines }
    }

    /// Lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of non-whitespace characters.
    pub fn char_count(&self) -> usize {
        self.lines
            .iter()
            .map(|l| l.text.chars().filter(|c| !c.is_whitespace()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.char_count() == 0
    }

    /// Anchors from `anchors` that do not appear anywhere (case-insensitive).
    pub fn missing_anchors<'a>(&self, anchors: &'a [String]) -> Vec<&'a str> {
        let haystack = self.text().to_lowercase();
        anchors
            .iter()
            .filter(|a| !haystack.contains(&a.to_lowercase()))
            .map(String::as_str)
            .collect()
    }
}

/// A text extraction backend.
pub trait TextExtractor: Send + Sync {
    /// Short backend name used in diagnostics and the status log.
    fn name(&self) -> &'static str;

    /// Extract ordered text lines from PDF bytes.
    fn extract(&self, data: &[u8]) -> Result<ExtractedText>;
}

/// How far an extraction falls short of the completeness thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completeness {
    pub chars: usize,
    pub min_chars: usize,
    pub missing_anchors: Vec<String>,
    pub anchors_total: usize,
}

impl Completeness {
    pub fn assess(text: &ExtractedText, config: &PdfConfig) -> Self {
        Self {
            chars: text.char_count(),
            min_chars: config.min_text_length,
            missing_anchors: text
                .missing_anchors(&config.required_anchors)
                .into_iter()
                .map(str::to_string)
                .collect(),
            anchors_total: config.required_anchors.len(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.chars >= self.min_chars && self.missing_anchors.is_empty()
    }

    /// Ordering key: anchors found first, then character count.
    fn score(&self) -> (usize, usize) {
        (self.anchors_total - self.missing_anchors.len(), self.chars)
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.chars < self.min_chars {
            parts.push(format!(
                "{} characters, below minimum {}",
                self.chars, self.min_chars
            ));
        }
        if !self.missing_anchors.is_empty() {
            parts.push(format!("missing anchors {:?}", self.missing_anchors));
        }
        parts.join(", ")
    }
}

/// Text chosen for a document, plus the reason the primary was passed over.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub text: ExtractedText,
    pub fallback_reason: Option<String>,
}

/// Choose between primary and secondary backend output.
///
/// The secondary backend is only run when the primary output errors or is
/// incomplete. If neither is complete the better non-empty one wins; if both
/// are empty or failed the document is unreadable.
pub fn select_text(
    primary: Result<ExtractedText>,
    secondary: impl FnOnce() -> Result<ExtractedText>,
    config: &PdfConfig,
) -> Result<Extraction> {
    let reason = match &primary {
        Ok(text) => {
            let completeness = Completeness::assess(text, config);
            if completeness.is_complete() {
                None
            } else {
                Some(format!(
                    "{} output incomplete: {}",
                    text.backend,
                    completeness.describe()
                ))
            }
        }
        Err(e) => Some(e.to_string()),
    };
    let Some(reason) = reason else {
        return primary.map(|text| Extraction {
            text,
            fallback_reason: None,
        });
    };
    debug!("Primary extraction not usable: {}", reason);

    let secondary = secondary();
    if secondary
        .as_ref()
        .is_ok_and(|t| Completeness::assess(t, config).is_complete())
    {
        warn!("Falling back to secondary backend: {}", reason);
        return secondary.map(|text| Extraction {
            text,
            fallback_reason: Some(reason),
        });
    }

    let score = |r: &Result<ExtractedText>| match r {
        Ok(t) if !t.is_empty() => Some(Completeness::assess(t, config).score()),
        _ => None,
    };

    match (score(&primary), score(&secondary)) {
        (Some(p), Some(s)) if s > p => Ok(Extraction {
            text: secondary?,
            fallback_reason: Some(reason),
        }),
        (Some(_), _) => Ok(Extraction {
            text: primary?,
            fallback_reason: None,
        }),
        (None, Some(_)) => Ok(Extraction {
            text: secondary?,
            fallback_reason: Some(reason),
        }),
        (None, None) => match (primary, secondary) {
            (Err(e), Err(_)) => Err(e),
            _ => Err(ExtractionError::NoText),
        },
    }
}

/// Primary plus fallback backend pair.
pub struct FallbackExtractor {
    primary: Box<dyn TextExtractor>,
    secondary: Box<dyn TextExtractor>,
    config: PdfConfig,
}

impl FallbackExtractor {
    /// Layout backend first, plain text second.
    pub fn new(config: PdfConfig) -> Self {
        Self {
            primary: Box::new(LayoutExtractor::new(
                config.layout,
                config.try_empty_password,
            )),
            secondary: Box::new(PlainTextExtractor::new(config.try_empty_password)),
            config,
        }
    }

    /// Use custom backends.
    pub fn with_backends(
        primary: Box<dyn TextExtractor>,
        secondary: Box<dyn TextExtractor>,
        config: PdfConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            config,
        }
    }

    pub fn extract(&self, data: &[u8]) -> Result<Extraction> {
        select_text(
            self.primary.extract(data),
            || self.secondary.extract(data),
            &self.config,
        )
    }
}

/// Parse a document, retrying encrypted files with the empty password.
///
/// When the file had to be decrypted, the decrypted re-save is returned too
/// so parsers that cannot decrypt on their own can read it.
pub(crate) fn load_document(
    data: &[u8],
    try_empty_password: bool,
) -> Result<(Document, Option<Vec<u8>>)> {
    let mut doc = Document::load_mem(data).map_err(|e| ExtractionError::Parse(e.to_string()))?;

    let decrypted = if doc.is_encrypted() {
        if !try_empty_password || doc.decrypt("").is_err() {
            return Err(ExtractionError::Encrypted);
        }
        debug!("Decrypted PDF with empty password");

        let mut decrypted = Vec::new();
        doc.save_to(&mut decrypted)
            .map_err(|e| ExtractionError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
        Some(decrypted)
    } else {
        None
    };

    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(ExtractionError::NoPages);
    }
    for page_id in pages.values() {
        check_parent_chain(&doc, *page_id)?;
    }

    Ok((doc, decrypted))
}

/// Walk `Parent` links from a page up to the root. Inherited attributes are
/// resolved along this chain, so a loop in it is a malformed document.
fn check_parent_chain(doc: &Document, page_id: ObjectId) -> Result<()> {
    let mut seen = HashSet::new();
    let mut node = Some(page_id);
    while let Some(id) = node {
        if !seen.insert(id) {
            return Err(ExtractionError::Parse(format!(
                "page tree has a Parent cycle at object {} {}",
                id.0, id.1
            )));
        }
        node = doc
            .get_dictionary(id)
            .ok()
            .and_then(|dict| dict.get(b"Parent").ok())
            .and_then(|parent| parent.as_reference().ok());
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixed(&'static str, Result<&'static str>);

    impl TextExtractor for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn extract(&self, _data: &[u8]) -> Result<ExtractedText> {
            self.1
                .clone()
                .map(|text| ExtractedText::from_plain(self.0, text))
        }
    }

    const COMPLETE: &str = "Invoice ID: 1001\nStatus: PAID\nProduct Acme Writer  $59.00\nTotal paid $59.00";

    fn run(primary: Result<&'static str>, secondary: Result<&'static str>) -> Result<Extraction> {
        FallbackExtractor::with_backends(
            Box::new(Fixed("layout", primary)),
            Box::new(Fixed("plain", secondary)),
            PdfConfig::default(),
        )
        .extract(b"")
    }

    #[test]
    fn test_complete_primary_is_kept() {
        let extraction = run(Ok(COMPLETE), Err(ExtractionError::NoText)).unwrap();
        assert_eq!(extraction.text.backend, "layout");
        assert_eq!(extraction.fallback_reason, None);
    }

    #[test]
    fn test_incomplete_primary_falls_back() {
        let extraction = run(Ok("Invoice ID: 1001"), Ok(COMPLETE)).unwrap();
        assert_eq!(extraction.text.backend, "plain");
        let reason = extraction.fallback_reason.unwrap();
        assert!(reason.contains("below minimum"), "{}", reason);
        assert!(reason.contains("Total paid"), "{}", reason);
    }

    #[test]
    fn test_failed_primary_falls_back() {
        let extraction = run(
            Err(ExtractionError::Backend {
                backend: "layout",
                message: "bad stream".to_string(),
            }),
            Ok(COMPLETE),
        )
        .unwrap();
        assert_eq!(extraction.text.backend, "plain");
    }

    #[test]
    fn test_better_partial_output_wins() {
        let extraction = run(Ok("Invoice"), Ok("Invoice 1001 Total paid")).unwrap();
        assert_eq!(extraction.text.backend, "plain");

        let extraction = run(Ok("Invoice 1001 Total paid"), Ok("")).unwrap();
        assert_eq!(extraction.text.backend, "layout");
        assert_eq!(extraction.fallback_reason, None);
    }

    #[test]
    fn test_both_empty_is_error() {
        assert_eq!(run(Ok("   "), Ok("")), Err(ExtractionError::NoText));
        assert_eq!(
            run(Err(ExtractionError::Encrypted), Err(ExtractionError::NoText)),
            Err(ExtractionError::Encrypted)
        );
    }

    #[test]
    fn test_from_plain_pages() {
        let text = ExtractedText::from_plain("plain", "one\n\n  \ntwo\u{c}three\n");
        let pages: Vec<u32> = text.lines.iter().map(|l| l.page).collect();
        assert_eq!(pages, vec![1, 1, 2]);
        assert_eq!(text.text(), "one\ntwo\nthree");
    }

    #[test]
    fn test_missing_anchors_case_insensitive() {
        let text = ExtractedText::from_plain("plain", "INVOICE\nTOTAL PAID $1.00");
        let anchors = vec!["Invoice".to_string(), "Total paid".to_string()];
        assert!(text.missing_anchors(&anchors).is_empty());
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            load_document(b"not a pdf", true),
            Err(ExtractionError::Parse(_))
        ));
    }

    #[test]
    fn test_load_rejects_parent_cycle() {
        let err = load_document(&fixtures::cyclic_tree_pdf(), true).unwrap_err();
        assert!(err.to_string().contains("Parent cycle"), "{}", err);

        let extractor = FallbackExtractor::new(PdfConfig::default());
        assert!(matches!(
            extractor.extract(&fixtures::cyclic_tree_pdf()),
            Err(ExtractionError::Parse(_))
        ));
    }
}
