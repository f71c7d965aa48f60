//! Rule-based field locator for deal invoices.
//!
//! Every invoice-level field is described by a [`FieldSpec`]: the labels
//! that introduce it, where to look for the value relative to each label,
//! and how to read the value. Fields are located independently over the
//! whole text, so the order in which labels appear on the page is
//! irrelevant.

pub mod amounts;
pub mod dates;
pub mod fields;
pub mod patterns;

pub use amounts::{find_money, format_amount, has_money, parse_amount, trailing_amounts, Money};
pub use dates::find_date;
pub use fields::{is_field_label, spec_for, FIELD_SPECS};

use chrono::NaiveDate;
use regex::Regex;

use crate::models::invoice::{Field, InvoiceStatus};
use patterns::{COLUMN_GAP, IDENTIFIER, STATUS_KEYWORD};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text lines.
    fn extract(&self, lines: &[&str]) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, lines: &[&str]) -> Vec<Self::Output>;
}

/// A located value together with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Line index and byte column of the label.
    pub position: Option<(usize, usize)>,
    /// Source text the value was read from.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.position = Some((line, column));
        self
    }
}

/// Where a value may appear relative to its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Rest of the label's line.
    SameLine,
    /// Rest of the line, or the following line when the rest is blank.
    NextLine,
    /// Rest of the line plus the next `n` lines.
    Window(usize),
}

impl SearchScope {
    /// Text segments the value may come from, nearest first.
    pub fn segments<'a>(&self, lines: &[&'a str], line: usize, rest: &'a str) -> Vec<&'a str> {
        match *self {
            SearchScope::SameLine => vec![rest],
            SearchScope::NextLine if rest.trim().is_empty() => {
                lines.get(line + 1).copied().into_iter().collect()
            }
            SearchScope::NextLine => vec![rest],
            SearchScope::Window(n) => std::iter::once(rest)
                .chain(lines.iter().skip(line + 1).take(n).copied())
                .collect(),
        }
    }
}

/// How a field's value is read and normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Token containing at least one digit.
    Identifier,
    /// Status keyword.
    Status,
    /// Calendar date.
    Date,
    /// Free text up to the next column gap.
    Text,
    /// Currency amount.
    Amount,
}

/// A normalized field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Status(InvoiceStatus),
    Date(NaiveDate),
    Amount(Money),
}

/// What one scope segment yielded.
#[derive(Debug, Clone, PartialEq)]
enum Candidate {
    Value(FieldValue, String),
    Unparseable(String),
    Nothing,
}

impl ValueKind {
    fn read(&self, segment: &str) -> Candidate {
        let column = first_column(segment);
        match self {
            ValueKind::Identifier => IDENTIFIER
                .captures(column)
                .map(|caps| caps["id"].to_string())
                .filter(|id| id.chars().any(|c| c.is_ascii_digit()))
                .map_or(Candidate::Nothing, |id| {
                    Candidate::Value(FieldValue::Text(id), column.to_string())
                }),
            ValueKind::Status => STATUS_KEYWORD.captures(column).map_or(Candidate::Nothing, |caps| {
                Candidate::Value(
                    FieldValue::Status(InvoiceStatus::from_keyword(&caps["word"])),
                    column.to_string(),
                )
            }),
            ValueKind::Date if column.is_empty() => Candidate::Nothing,
            ValueKind::Date => match find_date(column) {
                Some(date) => Candidate::Value(FieldValue::Date(date), column.to_string()),
                None => Candidate::Unparseable(column.to_string()),
            },
            ValueKind::Text if column.is_empty() => Candidate::Nothing,
            ValueKind::Text => {
                Candidate::Value(FieldValue::Text(column.to_string()), column.to_string())
            }
            ValueKind::Amount => {
                let found = find_money(segment);
                let Some(first) = found.first() else {
                    return Candidate::Nothing;
                };
                // Text between label and amount means the label was
                // something else ("Tax ID: ..."), not an amount label.
                if segment[..first.start].chars().any(char::is_alphabetic) {
                    return Candidate::Nothing;
                }
                match first.money {
                    Some(money) => {
                        Candidate::Value(FieldValue::Amount(money), first.raw.to_string())
                    }
                    None => Candidate::Unparseable(first.raw.to_string()),
                }
            }
        }
    }
}

/// Text before the first column gap, trimmed.
fn first_column(segment: &str) -> &str {
    let trimmed = segment.trim();
    COLUMN_GAP
        .find(trimmed)
        .map_or(trimmed, |gap| &trimmed[..gap.start()])
        .trim_matches(|c: char| c.is_whitespace() || c == ':')
}

/// A label that introduces a field value.
#[derive(Debug, Clone)]
pub struct Label {
    pub pattern: &'static Regex,
    pub scope: SearchScope,
}

/// Declarative description of one invoice field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: Field,
    pub kind: ValueKind,
    pub labels: Vec<Label>,
}

/// A label occurrence with its value; `None` when the value in scope did
/// not normalize.
pub type Located = ExtractionMatch<Option<FieldValue>>;

impl FieldExtractor for FieldSpec {
    type Output = Located;

    /// The first occurrence in document order that yields a value, else the
    /// first occurrence whose value failed to normalize.
    fn extract(&self, lines: &[&str]) -> Option<Located> {
        let all = self.extract_all(lines);
        let index = all.iter().position(|m| m.value.is_some()).unwrap_or(0);
        all.into_iter().nth(index)
    }

    fn extract_all(&self, lines: &[&str]) -> Vec<Located> {
        let mut occurrences = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            for label in &self.labels {
                for m in label.pattern.find_iter(line) {
                    occurrences.push((i, m.start(), m.end(), label.scope));
                }
            }
        }
        occurrences.sort_by_key(|(line, start, end, _)| (*line, *start, *end));
        occurrences.dedup_by_key(|(line, _, end, _)| (*line, *end));

        let mut results = Vec::new();
        for (i, start, end, scope) in occurrences {
            for segment in scope.segments(lines, i, &lines[i][end..]) {
                match self.kind.read(segment) {
                    Candidate::Value(value, source) => {
                        results.push(
                            ExtractionMatch::new(Some(value), source).with_position(i, start),
                        );
                        break;
                    }
                    Candidate::Unparseable(raw) => {
                        results.push(ExtractionMatch::new(None, raw).with_position(i, start));
                        break;
                    }
                    Candidate::Nothing => {}
                }
            }
        }
        results
    }
}

/// Locate one field in the text lines.
pub fn locate(lines: &[&str], spec: &FieldSpec) -> Option<Located> {
    spec.extract(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn value(lines: &[&str], field: Field) -> Option<FieldValue> {
        locate(lines, spec_for(field)).and_then(|m| m.value)
    }

    fn amount(lines: &[&str], field: Field) -> Option<Decimal> {
        match value(lines, field) {
            Some(FieldValue::Amount(money)) => Some(money.value),
            _ => None,
        }
    }

    fn text(lines: &[&str], field: Field) -> Option<String> {
        match value(lines, field) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_scope_segments() {
        let lines = ["Total paid", "$5.00", "next"];
        assert_eq!(SearchScope::SameLine.segments(&lines, 0, ""), vec![""]);
        assert_eq!(SearchScope::NextLine.segments(&lines, 0, " "), vec!["$5.00"]);
        assert_eq!(SearchScope::NextLine.segments(&lines, 0, " $1"), vec![" $1"]);
        assert_eq!(
            SearchScope::Window(2).segments(&lines, 0, ""),
            vec!["", "$5.00", "next"]
        );
        assert!(SearchScope::NextLine.segments(&lines, 2, "").is_empty());
    }

    #[test]
    fn test_invoice_id_labels() {
        assert_eq!(text(&["Invoice ID: 1001"], Field::InvoiceId), Some("1001".into()));
        assert_eq!(text(&["Invoice #A-77"], Field::InvoiceId), Some("A-77".into()));
        assert_eq!(text(&["Invoice number:", "42"], Field::InvoiceId), Some("42".into()));
        assert_eq!(text(&["Invoice ID: pending"], Field::InvoiceId), None);
    }

    #[test]
    fn test_status() {
        assert_eq!(
            value(&["Status: Refunded"], Field::Status),
            Some(FieldValue::Status(InvoiceStatus::Refunded))
        );
        assert_eq!(
            value(&["Status: disputed"], Field::Status),
            Some(FieldValue::Status(InvoiceStatus::Unknown))
        );
    }

    #[test]
    fn test_date_labels() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).map(FieldValue::Date);
        assert_eq!(value(&["Date: March 5, 2024"], Field::Date), expected);
        assert_eq!(value(&["Invoice date:", "Mar 5, 2024"], Field::Date), expected);
        assert_eq!(value(&["Date paid: 2024-03-05  Status: PAID"], Field::Date), expected);
    }

    #[test]
    fn test_unparseable_date_is_reported() {
        let located = locate(&["Date: sometime soon"], spec_for(Field::Date)).unwrap();
        assert_eq!(located.value, None);
        assert_eq!(located.source, "sometime soon");
    }

    #[test]
    fn test_text_fields_stop_at_column_gap() {
        let lines = ["Payment type: Visa ending in 4242  Tax ID: EU372000041"];
        assert_eq!(
            text(&lines, Field::PaymentType),
            Some("Visa ending in 4242".into())
        );
        assert_eq!(text(&lines, Field::TaxId), Some("EU372000041".into()));
    }

    #[test]
    fn test_amount_fields() {
        let lines = [
            "Invoice subtotal  $108.00",
            "Total applied plan discount  -$10.80",
            "Tax (8%)  $0.00",
            "Total paid (USD)",
            "$97.20",
        ];
        assert_eq!(amount(&lines, Field::Subtotal), Some(dec("108.00")));
        assert_eq!(amount(&lines, Field::PlanDiscountTotal), Some(dec("10.80")));
        assert_eq!(amount(&lines, Field::Tax), Some(dec("0.00")));
        assert_eq!(amount(&lines, Field::TotalPaid), Some(dec("97.20")));
    }

    #[test]
    fn test_label_without_money_does_not_count() {
        let lines = ["Tax ID: 12345", "Total paid by card", "Amount paid: $20.00"];
        assert_eq!(amount(&lines, Field::Tax), None);
        assert_eq!(amount(&lines, Field::TotalPaid), Some(dec("20.00")));
    }

    #[test]
    fn test_first_occurrence_with_value_wins() {
        let lines = ["Total paid", "Total paid  $1.00", "Total paid  $2.00"];
        let located = locate(&lines, spec_for(Field::TotalPaid)).unwrap();
        assert_eq!(located.position, Some((1, 0)));
        assert_eq!(amount(&lines, Field::TotalPaid), Some(dec("1.00")));
    }

    #[test]
    fn test_label_order_is_irrelevant() {
        let lines = ["Total paid  $53.10", "Status: PAID", "Invoice ID: 9"];
        assert_eq!(text(&lines, Field::InvoiceId), Some("9".into()));
        assert_eq!(amount(&lines, Field::TotalPaid), Some(dec("53.10")));
    }

    #[test]
    fn test_unparseable_amount() {
        let located = locate(&["Total paid $1.2.3"], spec_for(Field::TotalPaid)).unwrap();
        assert_eq!(located.value, None);
        assert_eq!(located.source, "$1.2.3");
    }
}
