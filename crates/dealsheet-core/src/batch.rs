//! Batch orchestration: many documents through one parser on a bounded
//! pool of blocking workers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use glob::{glob_with, MatchOptions};
use tracing::{debug, info, warn};

use crate::error::{DealsheetError, Result};
use crate::invoice::InvoiceParser;
use crate::models::invoice::ParseOutcome;

/// Callback invoked once per finished document, in completion order.
pub type ProgressFn = dyn Fn(&ParseOutcome) + Send + Sync;

/// Runs a parser over a list of files.
pub struct BatchRunner {
    parser: Arc<dyn InvoiceParser>,
    workers: usize,
    progress: Option<Box<ProgressFn>>,
}

impl BatchRunner {
    /// Create a runner with `workers` concurrent documents (at least one).
    pub fn new(parser: Arc<dyn InvoiceParser>, workers: usize) -> Self {
        Self {
            parser,
            workers: workers.max(1),
            progress: None,
        }
    }

    /// Report each finished document.
    pub fn with_progress(
        mut self,
        progress: impl Fn(&ParseOutcome) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Parse every file. Returns one outcome per input, in input order.
    pub async fn run(&self, files: Vec<PathBuf>) -> Vec<ParseOutcome> {
        info!("Processing {} file(s) with {} worker(s)", files.len(), self.workers);

        let mut indexed: Vec<(usize, ParseOutcome)> = stream::iter(files.into_iter().enumerate())
            .map(|(index, path)| {
                let parser = Arc::clone(&self.parser);
                async move {
                    let source_file = path.display().to_string();
                    let task_source = source_file.clone();
                    let task = tokio::task::spawn_blocking(move || {
                        parse_file(parser.as_ref(), &path, task_source)
                    });
                    let outcome = task.await.unwrap_or_else(|e| {
                        warn!("{}: worker failed: {}", source_file, e);
                        ParseOutcome::failure(source_file, format!("worker failed: {}", e))
                    });
                    (index, outcome)
                }
            })
            .buffer_unordered(self.workers)
            .inspect(|(_, outcome)| {
                if let Some(progress) = &self.progress {
                    progress(outcome);
                }
            })
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

fn parse_file(parser: &dyn InvoiceParser, path: &Path, source_file: String) -> ParseOutcome {
    match std::fs::read(path) {
        Ok(data) => {
            debug!("{}: read {} bytes", source_file, data.len());
            parser.parse(&source_file, &data)
        }
        Err(e) => {
            warn!("{}: {}", source_file, e);
            ParseOutcome::failure(source_file, format!("failed to read file: {}", e))
        }
    }
}

/// PDF files under `dir`, sorted by path.
pub fn discover_inputs(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DealsheetError::Config(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let pattern = if recursive {
        dir.join("**").join("*.pdf")
    } else {
        dir.join("*.pdf")
    };
    expand_pattern(&pattern.to_string_lossy())
}

/// Files matching a glob pattern (case-insensitive), sorted by path.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let mut files: Vec<PathBuf> = glob_with(pattern, options)
        .map_err(|e| DealsheetError::Config(format!("bad pattern {}: {}", pattern, e)))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}
