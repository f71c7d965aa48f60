//! Configuration structures for the parsing pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DealsheetError, Result};

/// Main configuration for the dealsheet pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealsheetConfig {
    /// PDF text extraction configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Batch runner configuration.
    pub batch: BatchConfig,
}

/// Grouping thresholds for the layout backend.
///
/// All margins are relative to the font size of the text run being placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Horizontal gap above which two runs are separate columns.
    pub char_margin: f32,

    /// Baseline distance under which two runs share a line.
    pub line_margin: f32,

    /// Horizontal gap above which a space is inserted.
    pub word_margin: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            char_margin: 2.0,
            line_margin: 0.3,
            word_margin: 0.2,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Layout thresholds for the primary backend.
    pub layout: LayoutParams,

    /// Minimum non-whitespace characters for output to count as complete.
    pub min_text_length: usize,

    /// Strings that must all appear (case-insensitive) for output to count
    /// as complete.
    pub required_anchors: Vec<String>,

    /// Retry encrypted documents with the empty user password.
    pub try_empty_password: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            layout: LayoutParams::default(),
            min_text_length: 50,
            required_anchors: vec!["Invoice".to_string(), "Total paid".to_string()],
            try_empty_password: true,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Rounding tolerance for amount reconciliation.
    pub tolerance: Decimal,

    /// Compare the filename id against the body id.
    pub check_filename_id: bool,

    /// Fill a lone line item's missing amounts from the invoice totals.
    pub infer_single_line_item: bool,

    /// Raise a diagnostic when amounts do not add up.
    pub reconcile_totals: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(1, 2),
            check_filename_id: true,
            infer_single_line_item: true,
            reconcile_totals: true,
        }
    }
}

/// Batch runner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker count; 0 means available CPU parallelism.
    pub workers: usize,

    /// Descend into subdirectories when the input is a directory.
    pub recursive: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            recursive: true,
        }
    }
}

impl BatchConfig {
    /// Resolve the configured worker count.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

impl DealsheetConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| DealsheetError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| DealsheetError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DealsheetConfig =
            serde_json::from_str(r#"{"pdf": {"min_text_length": 10}, "batch": {"workers": 3}}"#)
                .unwrap();

        assert_eq!(config.pdf.min_text_length, 10);
        assert_eq!(config.pdf.layout, LayoutParams::default());
        assert_eq!(config.extraction, ExtractionConfig::default());
        assert_eq!(config.batch.effective_workers(), 3);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = DealsheetConfig::default();
        config.extraction.tolerance = Decimal::new(5, 2);
        config.save(&path).unwrap();

        assert_eq!(DealsheetConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_bad_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            DealsheetConfig::from_file(&path),
            Err(DealsheetError::Config(_))
        ));
    }

    #[test]
    fn test_auto_workers() {
        assert!(BatchConfig::default().effective_workers() >= 1);
    }
}
