//! Deal invoice parser: extraction, field location and line items combined.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{Diagnostic, ExtractionError};
use crate::models::config::DealsheetConfig;
use crate::models::invoice::*;
use crate::pdf::FallbackExtractor;

use super::identifier::check_identifier;
use super::items::reconstruct;
use super::rules::{locate, FieldValue, FIELD_SPECS};

/// Failure reason when not a single invoice field could be located.
pub const NO_FIELDS: &str = "no recognizable invoice fields";

/// Trait for invoice parsing.
pub trait InvoiceParser: Send + Sync {
    /// Parse one document into its outcome. Never fails: unreadable
    /// documents become failure outcomes.
    fn parse(&self, source_file: &str, data: &[u8]) -> ParseOutcome;
}

/// Parser for the vendor's deal invoices.
pub struct DealInvoiceParser {
    extractor: FallbackExtractor,
    /// Rounding tolerance for amount checks.
    tolerance: Decimal,
    check_filename_id: bool,
    infer_single_line_item: bool,
    reconcile_totals: bool,
}

impl DealInvoiceParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::from_config(&DealsheetConfig::default())
    }

    /// Create a parser from configuration.
    pub fn from_config(config: &DealsheetConfig) -> Self {
        Self {
            extractor: FallbackExtractor::new(config.pdf.clone()),
            tolerance: config.extraction.tolerance,
            check_filename_id: config.extraction.check_filename_id,
            infer_single_line_item: config.extraction.infer_single_line_item,
            reconcile_totals: config.extraction.reconcile_totals,
        }
    }

    /// Use a custom text extractor.
    pub fn with_extractor(mut self, extractor: FallbackExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Set the amount tolerance.
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set filename id cross-checking.
    pub fn with_filename_check(mut self, check: bool) -> Self {
        self.check_filename_id = check;
        self
    }

    /// Set single line item inference.
    pub fn with_single_item_inference(mut self, infer: bool) -> Self {
        self.infer_single_line_item = infer;
        self
    }

    /// Set totals reconciliation.
    pub fn with_reconciliation(mut self, reconcile: bool) -> Self {
        self.reconcile_totals = reconcile;
        self
    }

    /// Parse lines that were already extracted by `backend`.
    pub fn parse_lines(&self, source_file: &str, lines: &[&str], backend: &str) -> ParseOutcome {
        let mut diagnostics = Vec::new();
        let mut invoice = InvoiceRecord::default();

        for spec in FIELD_SPECS.iter() {
            match locate(lines, spec) {
                Some(located) => match located.value {
                    Some(value) => apply_field(&mut invoice, spec.field, value),
                    None => {
                        warn!(
                            "{}: could not normalize {} from {:?}",
                            source_file, spec.field, located.source
                        );
                        diagnostics.push(Diagnostic::FieldUnparseable {
                            field: spec.field,
                            raw: located.source,
                        });
                    }
                },
                None => diagnostics.push(Diagnostic::FieldMissing(spec.field)),
            }
        }

        if invoice.is_empty() {
            warn!("{}: {}", source_file, NO_FIELDS);
            return ParseOutcome::failure(source_file, NO_FIELDS);
        }

        if self.check_filename_id {
            if let Some(diagnostic) = check_identifier(&mut invoice, source_file) {
                diagnostics.retain(|d| *d != Diagnostic::FieldMissing(Field::InvoiceId));
                diagnostics.push(diagnostic);
            }
        }

        let table = reconstruct(lines);
        for diagnostic in &table.diagnostics {
            warn!("{}: {}", source_file, diagnostic);
        }
        diagnostics.extend(table.diagnostics);
        let mut line_items = table.items;

        if self.infer_single_line_item {
            if let [item] = line_items.as_mut_slice() {
                infer_single_item(&invoice, item);
            }
        }

        if self.reconcile_totals {
            diagnostics.extend(
                reconcile(&invoice, &line_items, self.tolerance)
                    .into_iter()
                    .map(Diagnostic::TotalsMismatch),
            );
        }

        info!(
            "{}: invoice {} with {} line item(s) from {} backend",
            source_file,
            invoice.invoice_id.as_deref().unwrap_or("?"),
            line_items.len(),
            backend
        );

        ParseOutcome::Success(ParsedInvoice {
            source_file: source_file.to_string(),
            invoice,
            line_items,
            backend: backend.to_string(),
            diagnostics,
        })
    }
}

impl Default for DealInvoiceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceParser for DealInvoiceParser {
    fn parse(&self, source_file: &str, data: &[u8]) -> ParseOutcome {
        let extraction = match self.extractor.extract(data) {
            Ok(extraction) => extraction,
            Err(ExtractionError::NoText) => {
                debug!("{}: no extractable text", source_file);
                return self.parse_lines(source_file, &[], "none");
            }
            Err(e) => {
                warn!("{}: {}", source_file, e);
                return ParseOutcome::failure(source_file, e.to_string());
            }
        };

        let text = &extraction.text;
        let lines: Vec<&str> = text.lines.iter().map(|l| l.text.as_str()).collect();
        debug!(
            "{}: {} lines from {} backend",
            source_file,
            lines.len(),
            text.backend
        );

        let mut outcome = self.parse_lines(source_file, &lines, text.backend);
        let fallback_reason = extraction.fallback_reason.clone();
        if let (ParseOutcome::Success(parsed), Some(reason)) = (&mut outcome, fallback_reason) {
            parsed.diagnostics.insert(
                0,
                Diagnostic::FallbackBackend {
                    backend: text.backend,
                    reason,
                },
            );
        }
        outcome
    }
}

fn apply_field(invoice: &mut InvoiceRecord, field: Field, value: FieldValue) {
    match (field, value) {
        (Field::InvoiceId, FieldValue::Text(id)) => invoice.invoice_id = Some(id),
        (Field::Status, FieldValue::Status(status)) => invoice.status = Some(status),
        (Field::Date, FieldValue::Date(date)) => invoice.date = Some(date),
        (Field::PaymentType, FieldValue::Text(text)) => invoice.payment_type = Some(text),
        (Field::TaxId, FieldValue::Text(text)) => invoice.tax_id = Some(text),
        (Field::Subtotal, FieldValue::Amount(money)) => invoice.subtotal = Some(money.signed()),
        (Field::PlanDiscountTotal, FieldValue::Amount(money)) => {
            invoice.plan_discount_total = Some(money.value)
        }
        (Field::Tax, FieldValue::Amount(money)) => invoice.tax = Some(money.signed()),
        (Field::TotalPaid, FieldValue::Amount(money)) => invoice.total_paid = Some(money.signed()),
        (field, value) => debug!("Ignoring {:?} for {}", value, field),
    }
}

/// Fill a lone item's missing amounts from the invoice totals.
///
/// Assumes the invoice-level discount applies entirely to the one item.
fn infer_single_item(invoice: &InvoiceRecord, item: &mut LineItemRecord) {
    if item.subtotal.is_none() {
        item.subtotal = invoice.subtotal;
    }
    if item.plan_discount.is_none() {
        item.plan_discount = invoice.plan_discount_total;
    }
    if item.total.is_none() {
        item.total = invoice.total_paid.or_else(|| {
            item.subtotal
                .map(|subtotal| subtotal - item.plan_discount.unwrap_or(Decimal::ZERO))
        });
    }
}

/// Amount checks that failed, as messages.
fn reconcile(invoice: &InvoiceRecord, items: &[LineItemRecord], tolerance: Decimal) -> Vec<String> {
    let mut problems: Vec<String> = invoice.check_totals(tolerance).into_iter().collect();
    problems.extend(items.iter().filter_map(|item| item.check_totals(tolerance)));

    if items.len() >= 2 {
        let totals: Option<Vec<Decimal>> = items.iter().map(|item| item.total).collect();
        if let (Some(totals), Some(paid)) = (totals, invoice.total_paid) {
            let sum: Decimal = totals.iter().sum();
            let expected = paid - invoice.tax.unwrap_or(Decimal::ZERO);
            if (sum - expected).abs() > tolerance {
                problems.push(format!(
                    "line totals sum to {}, but total paid less tax is {}",
                    sum, expected
                ));
            }
        }
    }

    problems
}
