//! Layout-aware text extraction.
//!
//! pdf-extract interprets each page's content stream and reports every glyph
//! with its text rendering matrix. Adjacent glyphs are merged into runs, runs
//! sharing a baseline are grouped into lines, and horizontal gaps decide
//! whether neighbouring runs are glued, separated by a space, or separated by
//! a column gap (two spaces).

use std::panic::{self, AssertUnwindSafe};

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use tracing::{debug, trace};

use super::{load_document, ExtractedText, Result, TextExtractor, TextLine};
use crate::error::ExtractionError;
use crate::models::config::LayoutParams;

const BACKEND: &str = "layout";

/// Primary backend: positions every glyph and rebuilds lines from them.
pub struct LayoutExtractor {
    params: LayoutParams,
    try_empty_password: bool,
}

impl LayoutExtractor {
    pub fn new(params: LayoutParams, try_empty_password: bool) -> Self {
        Self {
            params,
            try_empty_password,
        }
    }
}

impl Default for LayoutExtractor {
    fn default() -> Self {
        Self::new(LayoutParams::default(), true)
    }
}

impl TextExtractor for LayoutExtractor {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn extract(&self, data: &[u8]) -> Result<ExtractedText> {
        let (_, decrypted) = load_document(data, self.try_empty_password)?;
        let bytes = decrypted.as_deref().unwrap_or(data);

        // pdf-extract links its own lopdf, so it gets its own parse.
        let doc = pdf_extract::Document::load_mem(bytes)
            .map_err(|e| ExtractionError::Parse(e.to_string()))?;

        let mut collector = RunCollector::new(&self.params);
        match panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::output_doc(&doc, &mut collector)
        })) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(backend_error(e.to_string())),
            Err(_) => return Err(backend_error("content stream interpreter panicked".to_string())),
        }

        debug!("Layout backend extracted {} lines", collector.lines.len());
        Ok(ExtractedText {
            backend: BACKEND,
            lines: collector.lines,
        })
    }
}

fn backend_error(message: String) -> ExtractionError {
    ExtractionError::Backend {
        backend: BACKEND,
        message,
    }
}

/// A positioned piece of text in page space.
#[derive(Debug, Clone, PartialEq)]
struct Run {
    x: f32,
    y: f32,
    end_x: f32,
    size: f32,
    text: String,
}

/// Receives glyphs from pdf-extract and turns each page into lines.
struct RunCollector<'a> {
    params: &'a LayoutParams,
    page: u32,
    runs: Vec<Run>,
    lines: Vec<TextLine>,
}

impl<'a> RunCollector<'a> {
    fn new(params: &'a LayoutParams) -> Self {
        Self {
            params,
            page: 0,
            runs: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Append to the last run when the glyph starts where that run ends.
    fn push_glyph(&mut self, x: f32, y: f32, end_x: f32, size: f32, text: &str) {
        if let Some(last) = self.runs.last_mut() {
            let tolerance = 0.1 * last.size.max(size);
            if (last.y - y).abs() <= tolerance && (x - last.end_x).abs() <= tolerance {
                last.text.push_str(text);
                last.end_x = end_x;
                return;
            }
        }
        self.runs.push(Run {
            x,
            y,
            end_x,
            size,
            text: text.to_string(),
        });
    }
}

impl OutputDev for RunCollector<'_> {
    fn begin_page(
        &mut self,
        page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.page = page_num;
        self.runs.clear();
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        let runs = std::mem::take(&mut self.runs);
        trace!("Page {}: {} text runs", self.page, runs.len());
        self.lines.extend(group_lines(runs, self.page, self.params));
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        glyph: &str,
    ) -> std::result::Result<(), OutputError> {
        if glyph.is_empty() {
            return Ok(());
        }
        let size = (font_size * trm.m21.hypot(trm.m22)).abs().max(1.0);
        let advance = width * font_size * trm.m11.hypot(trm.m12);
        self.push_glyph(
            trm.m31 as f32,
            trm.m32 as f32,
            (trm.m31 + advance) as f32,
            size as f32,
            glyph,
        );
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }
}

/// Group runs sharing a baseline into lines, top of the page first.
fn group_lines(mut runs: Vec<Run>, page: u32, params: &LayoutParams) -> Vec<TextLine> {
    runs.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<Run>> = Vec::new();
    for run in runs {
        match lines.last_mut() {
            Some(line)
                if (line[0].y - run.y).abs() <= params.line_margin * line[0].size.max(run.size) =>
            {
                line.push(run)
            }
            _ => lines.push(vec![run]),
        }
    }

    lines
        .into_iter()
        .filter_map(|mut line| {
            line.sort_by(|a, b| a.x.total_cmp(&b.x));
            let text = join_runs(&line, params);
            let text = text.trim();
            (!text.is_empty()).then(|| TextLine {
                text: text.to_string(),
                page,
                y: Some(line[0].y),
            })
        })
        .collect()
}

fn join_runs(runs: &[Run], params: &LayoutParams) -> String {
    let mut text = String::new();
    let mut previous: Option<(f32, f32)> = None;

    for run in runs {
        let mut piece = run.text.as_str();
        if let Some((end_x, size)) = previous {
            let gap = run.x - end_x;
            let size = size.max(run.size);
            if gap > params.char_margin * size {
                text.truncate(text.trim_end().len());
                text.push_str("  ");
                piece = piece.trim_start();
            } else if gap > params.word_margin * size
                && !text.ends_with(' ')
                && !piece.starts_with(' ')
            {
                text.push(' ');
            }
        }
        text.push_str(piece);
        let end_x = previous.map_or(run.end_x, |(e, _)| e.max(run.end_x));
        previous = Some((end_x, run.size));
    }

    text
}
