//! Common regex patterns for deal invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Field labels. Each match ends where the value scope begins.
    pub static ref INVOICE_ID_LABEL: Regex = Regex::new(
        r"(?i)\binvoice\s*id\s*:"
    ).unwrap();

    pub static ref INVOICE_HASH_LABEL: Regex = Regex::new(
        r"(?i)\binvoice\s*#"
    ).unwrap();

    pub static ref INVOICE_NUMBER_LABEL: Regex = Regex::new(
        r"(?i)\binvoice\s+number\s*:?"
    ).unwrap();

    pub static ref STATUS_LABEL: Regex = Regex::new(
        r"(?i)\bstatus\s*:"
    ).unwrap();

    pub static ref DATE_LABEL: Regex = Regex::new(
        r"(?i)(?:^|[^A-Za-z])date\s*:"
    ).unwrap();

    pub static ref INVOICE_DATE_LABEL: Regex = Regex::new(
        r"(?i)\binvoice\s+date\s*:"
    ).unwrap();

    pub static ref DATE_PAID_LABEL: Regex = Regex::new(
        r"(?i)\bdate\s+paid\s*:"
    ).unwrap();

    pub static ref PAYMENT_TYPE_LABEL: Regex = Regex::new(
        r"(?i)\bpayment\s+type\s*:"
    ).unwrap();

    pub static ref PAYMENT_METHOD_LABEL: Regex = Regex::new(
        r"(?i)\bpayment\s+method\s*:"
    ).unwrap();

    pub static ref TAX_ID_LABEL: Regex = Regex::new(
        r"(?i)\b(?:tax|vat)\s+id\s*:"
    ).unwrap();

    pub static ref INVOICE_SUBTOTAL_LABEL: Regex = Regex::new(
        r"(?i)\binvoice\s+subtotal\b\s*:?"
    ).unwrap();

    pub static ref PLAN_DISCOUNT_TOTAL_LABEL: Regex = Regex::new(
        r"(?i)\btotal\s+(?:applied\s+)?plan\s+discount\b\s*:?"
    ).unwrap();

    // Line-leading only, so "Tax" inside a product name is not a label.
    pub static ref TAX_LABEL: Regex = Regex::new(
        r"(?i)^\s*tax\b(?:\s*\([^)]*%\s*\))?\s*:?"
    ).unwrap();

    pub static ref SALES_TAX_LABEL: Regex = Regex::new(
        r"(?i)\bsales\s+tax\b(?:\s*\([^)]*%\s*\))?\s*:?"
    ).unwrap();

    pub static ref TOTAL_PAID_LABEL: Regex = Regex::new(
        r"(?i)\btotal\s+paid\b(?:\s*\(\s*[A-Za-z]{3}\s*\))?\s*:?"
    ).unwrap();

    pub static ref AMOUNT_PAID_LABEL: Regex = Regex::new(
        r"(?i)\bamount\s+paid\b(?:\s*\(\s*[A-Za-z]{3}\s*\))?\s*:?"
    ).unwrap();

    // Money: optional sign, optional currency, digits with separators.
    pub static ref MONEY: Regex = Regex::new(
        r"(?P<open>[-\u{2013}\u{2212}(])?\s*(?P<cur>[$€£]|(?:USD|EUR|GBP)\s?)?\s*(?P<sign>[-\u{2013}\u{2212}])?(?P<num>\d[\d,.]*\d|\d)(?P<close>\))?(?:\s?(?P<code>USD|EUR|GBP)\b)?"
    ).unwrap();

    // Identifiers: invoice numbers and similar tokens.
    pub static ref IDENTIFIER: Regex = Regex::new(
        r"^#?(?P<id>[A-Za-z0-9][A-Za-z0-9._/\-]*)"
    ).unwrap();

    pub static ref STATUS_KEYWORD: Regex = Regex::new(
        r"^\s*(?P<word>[A-Za-z]+)"
    ).unwrap();

    // Dates
    pub static ref DATE_MONTH_FIRST: Regex = Regex::new(
        r"(?i)\b(?P<month>[A-Za-z]{3,9})\.?\s+(?P<day>\d{1,2})(?:st|nd|rd|th)?,?\s+(?P<year>\d{4})\b"
    ).unwrap();

    pub static ref DATE_DAY_FIRST: Regex = Regex::new(
        r"(?i)\b(?P<day>\d{1,2})(?:st|nd|rd|th)?\s+(?P<month>[A-Za-z]{3,9})\.?,?\s+(?P<year>\d{4})\b"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(?P<year>\d{4})-(?P<month>\d{1,2})-(?P<day>\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_US: Regex = Regex::new(
        r"\b(?P<month>\d{1,2})/(?P<day>\d{1,2})/(?P<year>\d{4})\b"
    ).unwrap();

    // Line item table
    pub static ref TABLE_HEADER: Regex = Regex::new(
        r"(?i)^\s*(?:product|item|description)s?\b(?P<rest>.*)$"
    ).unwrap();

    pub static ref TABLE_HEADER_COLUMN: Regex = Regex::new(
        r"(?i)\b(?:deal\s+plan|subtotal|discount|total|amount|price)\b"
    ).unwrap();

    pub static ref TABLE_END: Regex = Regex::new(
        r"(?i)^\s*(?:invoice\s+subtotal|total\s+(?:applied\s+)?plan\s+discount|total\s+paid|amount\s+paid)\b"
    ).unwrap();

    pub static ref COLUMN_GAP: Regex = Regex::new(
        r"\s{2,}|\t"
    ).unwrap();

    pub static ref DEAL_PLAN_ROW: Regex = Regex::new(
        r"(?i)^\s*(?:deal\s+)?plan\s*:\s*(?P<value>.*)$"
    ).unwrap();

    pub static ref SUBTOTAL_ROW: Regex = Regex::new(
        r"(?i)^\s*subtotal\b"
    ).unwrap();

    pub static ref DISCOUNT_ROW: Regex = Regex::new(
        r"(?i)^\s*(?:plan\s+)?discount\b"
    ).unwrap();

    pub static ref TOTAL_ROW: Regex = Regex::new(
        r"(?i)^\s*total\b"
    ).unwrap();

    // Filenames: invoice-<id>.pdf
    pub static ref FILENAME_PREFIX: Regex = Regex::new(
        r"(?i)^invoice[-_]"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_case_insensitive() {
        assert!(INVOICE_ID_LABEL.is_match("INVOICE ID: 1"));
        assert!(TOTAL_PAID_LABEL.is_match("total paid (usd) $1.00"));
        assert!(PLAN_DISCOUNT_TOTAL_LABEL.is_match("Total applied plan discount"));
        assert!(PLAN_DISCOUNT_TOTAL_LABEL.is_match("Total plan discount"));
    }

    #[test]
    fn test_date_label_does_not_match_inside_words() {
        assert!(DATE_LABEL.is_match("Date: March 5, 2024"));
        assert!(DATE_LABEL.is_match("Invoice date: March 5, 2024"));
        assert!(!DATE_LABEL.is_match("Update: none"));
    }

    #[test]
    fn test_tax_label_is_line_leading() {
        assert!(TAX_LABEL.is_match("Tax (8.25%)  $1.00"));
        assert!(TAX_LABEL.is_match("  Tax  $0.00"));
        assert!(!TAX_LABEL.is_match("TaxBot Pro  $10.00"));
        assert!(!TAX_LABEL.is_match("Acme Tax Helper  $10.00"));
    }

    #[test]
    fn test_table_end() {
        assert!(TABLE_END.is_match("Invoice subtotal  $10.00"));
        assert!(TABLE_END.is_match("Total paid: $10.00"));
        assert!(!TABLE_END.is_match("Total  $10.00"));
    }
}
