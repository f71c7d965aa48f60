//! Flattened output rows: one per line item, invoice fields repeated.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::invoice::{InvoiceStatus, LineItemRecord, ParseOutcome, ParsedInvoice};

/// Output column names, in order.
pub const COLUMNS: [&str; 15] = [
    "invoice_id",
    "invoice_status",
    "invoice_date",
    "payment_type",
    "tax_id",
    "product_name",
    "deal_plan",
    "line_subtotal",
    "line_plan_discount",
    "line_total",
    "invoice_subtotal",
    "invoice_plan_discount_total",
    "invoice_tax",
    "invoice_total_paid",
    "_source_file",
];

/// One table row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub invoice_id: Option<String>,
    pub invoice_status: Option<InvoiceStatus>,
    pub invoice_date: Option<NaiveDate>,
    pub payment_type: Option<String>,
    pub tax_id: Option<String>,
    pub product_name: Option<String>,
    pub deal_plan: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub line_subtotal: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub line_plan_discount: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub line_total: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub invoice_subtotal: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub invoice_plan_discount_total: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub invoice_tax: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub invoice_total_paid: Option<Decimal>,
    #[serde(rename = "_source_file")]
    pub source_file: String,
}

/// A cell as written to a spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(Decimal),
}

impl InvoiceRow {
    fn new(parsed: &ParsedInvoice, item: Option<&LineItemRecord>) -> Self {
        let invoice = &parsed.invoice;
        Self {
            invoice_id: invoice.invoice_id.clone(),
            invoice_status: invoice.status,
            invoice_date: invoice.date,
            payment_type: invoice.payment_type.clone(),
            tax_id: invoice.tax_id.clone(),
            product_name: item
                .map(|i| i.product_name.clone())
                .filter(|name| !name.is_empty()),
            deal_plan: item.and_then(|i| i.deal_plan.clone()),
            line_subtotal: item.and_then(|i| i.subtotal),
            line_plan_discount: item.and_then(|i| i.plan_discount),
            line_total: item.and_then(|i| i.total),
            invoice_subtotal: invoice.subtotal,
            invoice_plan_discount_total: invoice.plan_discount_total,
            invoice_tax: invoice.tax,
            invoice_total_paid: invoice.total_paid,
            source_file: parsed.source_file.clone(),
        }
    }

    /// Rows for one outcome. Failures yield none; an invoice without line
    /// items still yields one row.
    pub fn from_outcome(outcome: &ParseOutcome) -> Vec<Self> {
        match outcome {
            ParseOutcome::Failure(_) => Vec::new(),
            ParseOutcome::Success(parsed) if parsed.line_items.is_empty() => {
                vec![Self::new(parsed, None)]
            }
            ParseOutcome::Success(parsed) => parsed
                .line_items
                .iter()
                .map(|item| Self::new(parsed, Some(item)))
                .collect(),
        }
    }

    /// Cells in column order.
    pub fn cells(&self) -> [Cell; 15] {
        fn text(value: Option<&str>) -> Cell {
            value.map_or(Cell::Empty, |s| Cell::Text(s.to_string()))
        }
        fn number(value: Option<Decimal>) -> Cell {
            value.map_or(Cell::Empty, Cell::Number)
        }

        [
            text(self.invoice_id.as_deref()),
            text(self.invoice_status.map(|s| s.as_str())),
            self.invoice_date.map_or(Cell::Empty, |d| Cell::Text(d.to_string())),
            text(self.payment_type.as_deref()),
            text(self.tax_id.as_deref()),
            text(self.product_name.as_deref()),
            text(self.deal_plan.as_deref()),
            number(self.line_subtotal),
            number(self.line_plan_discount),
            number(self.line_total),
            number(self.invoice_subtotal),
            number(self.invoice_plan_discount_total),
            number(self.invoice_tax),
            number(self.invoice_total_paid),
            Cell::Text(self.source_file.clone()),
        ]
    }
}

/// Rows for every outcome, in outcome order.
pub fn table_rows(outcomes: &[ParseOutcome]) -> Vec<InvoiceRow> {
    outcomes.iter().flat_map(InvoiceRow::from_outcome).collect()
}
