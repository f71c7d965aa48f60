//! Invoice, line item and parse outcome models.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;

/// Invoice-level fields the locator searches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    InvoiceId,
    Status,
    Date,
    PaymentType,
    TaxId,
    Subtotal,
    PlanDiscountTotal,
    Tax,
    TotalPaid,
}

impl Field {
    /// Every field, in output column order.
    pub const ALL: [Field; 9] = [
        Field::InvoiceId,
        Field::Status,
        Field::Date,
        Field::PaymentType,
        Field::TaxId,
        Field::Subtotal,
        Field::PlanDiscountTotal,
        Field::Tax,
        Field::TotalPaid,
    ];

    /// Output column carrying this field.
    pub fn column(&self) -> &'static str {
        match self {
            Field::InvoiceId => "invoice_id",
            Field::Status => "invoice_status",
            Field::Date => "invoice_date",
            Field::PaymentType => "payment_type",
            Field::TaxId => "tax_id",
            Field::Subtotal => "invoice_subtotal",
            Field::PlanDiscountTotal => "invoice_plan_discount_total",
            Field::Tax => "invoice_tax",
            Field::TotalPaid => "invoice_total_paid",
        }
    }

    /// Whether the field holds a currency amount.
    pub fn is_amount(&self) -> bool {
        matches!(
            self,
            Field::Subtotal | Field::PlanDiscountTotal | Field::Tax | Field::TotalPaid
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Payment status printed on the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Paid,
    Refunded,
    /// A status keyword the vendor does not normally print.
    Unknown,
}

impl InvoiceStatus {
    /// Map the keyword following the status label.
    pub fn from_keyword(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "PAID" => InvoiceStatus::Paid,
            "REFUNDED" => InvoiceStatus::Refunded,
            _ => InvoiceStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Refunded => "REFUNDED",
            InvoiceStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Invoice-level summary.
///
/// Every field is optional: a label that could not be found or normalized
/// leaves its field empty rather than failing the document. Discounts hold
/// the non-negative amount that was subtracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Invoice identifier, unique within a batch.
    pub invoice_id: Option<String>,

    /// Payment status.
    pub status: Option<InvoiceStatus>,

    /// Invoice date.
    pub date: Option<NaiveDate>,

    /// Payment type, e.g. "Visa ending in 4242".
    pub payment_type: Option<String>,

    /// Buyer tax identifier.
    pub tax_id: Option<String>,

    /// Sum of line subtotals before discounts.
    pub subtotal: Option<Decimal>,

    /// Total applied plan discount.
    pub plan_discount_total: Option<Decimal>,

    /// Tax charged.
    pub tax: Option<Decimal>,

    /// Amount actually paid.
    pub total_paid: Option<Decimal>,
}

impl InvoiceRecord {
    /// Whether a given field holds a value.
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::InvoiceId => self.invoice_id.is_some(),
            Field::Status => self.status.is_some(),
            Field::Date => self.date.is_some(),
            Field::PaymentType => self.payment_type.is_some(),
            Field::TaxId => self.tax_id.is_some(),
            Field::Subtotal => self.subtotal.is_some(),
            Field::PlanDiscountTotal => self.plan_discount_total.is_some(),
            Field::Tax => self.tax.is_some(),
            Field::TotalPaid => self.total_paid.is_some(),
        }
    }

    /// Fields that hold no value.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL.into_iter().filter(|f| !self.has(*f)).collect()
    }

    /// True when no field at all was located.
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| !self.has(*f))
    }

    /// Check `subtotal - discount + tax ≈ total_paid`.
    ///
    /// Returns a description of the mismatch, or `None` when the amounts
    /// agree or are not all present.
    pub fn check_totals(&self, tolerance: Decimal) -> Option<String> {
        let (subtotal, discount, tax, paid) = (
            self.subtotal?,
            self.plan_discount_total?,
            self.tax?,
            self.total_paid?,
        );
        let expected = subtotal - discount + tax;
        if (expected - paid).abs() > tolerance {
            Some(format!(
                "invoice subtotal {} - discount {} + tax {} = {}, but total paid is {}",
                subtotal, discount, tax, expected, paid
            ))
        } else {
            None
        }
    }
}

/// One product line within an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRecord {
    /// Product name, wrapped description lines space-joined.
    pub product_name: String,

    /// Deal plan description (license tier, code stack, ...).
    pub deal_plan: Option<String>,

    /// Line subtotal before discount.
    pub subtotal: Option<Decimal>,

    /// Plan discount applied to this line.
    pub plan_discount: Option<Decimal>,

    /// Line total after discount.
    pub total: Option<Decimal>,
}

impl LineItemRecord {
    /// Create a line item with just a product name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            product_name: name.into(),
            ..Self::default()
        }
    }

    /// Check `subtotal - discount ≈ total`.
    pub fn check_totals(&self, tolerance: Decimal) -> Option<String> {
        let (subtotal, total) = (self.subtotal?, self.total?);
        let discount = self.plan_discount.unwrap_or(Decimal::ZERO);
        let expected = subtotal - discount;
        if (expected - total).abs() > tolerance {
            Some(format!(
                "line {:?}: subtotal {} - discount {} = {}, but total is {}",
                self.product_name, subtotal, discount, expected, total
            ))
        } else {
            None
        }
    }
}

/// A successfully parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedInvoice {
    /// Path of the source PDF, as given.
    pub source_file: String,

    /// Invoice-level record.
    pub invoice: InvoiceRecord,

    /// Product lines, in document order.
    pub line_items: Vec<LineItemRecord>,

    /// Backend whose text was parsed.
    pub backend: String,

    /// Soft problems encountered while parsing.
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedInvoice {
    /// Whether any layout mismatch was recorded.
    pub fn has_layout_mismatch(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_layout_mismatch)
    }
}

/// A document that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    /// Path of the source PDF, as given.
    pub source_file: String,

    /// Human-readable reason.
    pub reason: String,
}

/// The single result produced for every input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ParseOutcome {
    Success(ParsedInvoice),
    Failure(ParseFailure),
}

impl ParseOutcome {
    /// Build a failure outcome.
    pub fn failure(source_file: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseOutcome::Failure(ParseFailure {
            source_file: source_file.into(),
            reason: reason.into(),
        })
    }

    pub fn source_file(&self) -> &str {
        match self {
            ParseOutcome::Success(parsed) => &parsed.source_file,
            ParseOutcome::Failure(failure) => &failure.source_file,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Success(_))
    }

    /// Invoice id, when the document parsed and carried one.
    pub fn invoice_id(&self) -> Option<&str> {
        match self {
            ParseOutcome::Success(parsed) => parsed.invoice.invoice_id.as_deref(),
            ParseOutcome::Failure(_) => None,
        }
    }

    /// Status log note: diagnostics or the failure reason.
    pub fn note(&self) -> String {
        match self {
            ParseOutcome::Success(parsed) => parsed
                .diagnostics
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join("; "),
            ParseOutcome::Failure(failure) => failure.reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_status_keywords() {
        assert_eq!(InvoiceStatus::from_keyword("paid"), InvoiceStatus::Paid);
        assert_eq!(InvoiceStatus::from_keyword(" REFUNDED "), InvoiceStatus::Refunded);
        assert_eq!(InvoiceStatus::from_keyword("pending"), InvoiceStatus::Unknown);
        assert_eq!(InvoiceStatus::Refunded.as_str(), "REFUNDED");
    }

    #[test]
    fn test_invoice_totals_check() {
        let mut invoice = InvoiceRecord {
            subtotal: Some(dec("59.00")),
            plan_discount_total: Some(dec("5.90")),
            tax: Some(dec("0.00")),
            total_paid: Some(dec("53.10")),
            ..InvoiceRecord::default()
        };
        assert_eq!(invoice.check_totals(dec("0.01")), None);

        invoice.total_paid = Some(dec("50.00"));
        assert!(invoice.check_totals(dec("0.01")).is_some());

        invoice.tax = None;
        assert_eq!(invoice.check_totals(dec("0.01")), None);
    }

    #[test]
    fn test_line_totals_check() {
        let item = LineItemRecord {
            product_name: "Acme Writer".to_string(),
            deal_plan: None,
            subtotal: Some(dec("123.45")),
            plan_discount: Some(dec("12.35")),
            total: Some(dec("111.10")),
        };
        assert_eq!(item.check_totals(dec("0.01")), None);
    }

    #[test]
    fn test_missing_fields() {
        let invoice = InvoiceRecord {
            invoice_id: Some("1001".to_string()),
            ..InvoiceRecord::default()
        };
        assert!(!invoice.is_empty());
        assert_eq!(invoice.missing_fields().len(), 8);
        assert!(InvoiceRecord::default().is_empty());
    }

    #[test]
    fn test_outcome_note() {
        let outcome = ParseOutcome::failure("a.pdf", "no recognizable invoice fields");
        assert!(!outcome.is_success());
        assert_eq!(outcome.note(), "no recognizable invoice fields");
        assert_eq!(outcome.source_file(), "a.pdf");
    }
}
