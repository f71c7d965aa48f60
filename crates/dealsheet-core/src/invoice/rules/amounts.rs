//! Amount parsing for deal invoices.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::MONEY;

/// A parsed currency amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money {
    /// Magnitude of the amount.
    pub value: Decimal,
    /// Printed with a minus, en dash or parentheses.
    pub negative: bool,
}

impl Money {
    /// The amount with its sign applied.
    pub fn signed(&self) -> Decimal {
        if self.negative { -self.value } else { self.value }
    }
}

/// A money-like token found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyMatch<'a> {
    /// Matched text.
    pub raw: &'a str,
    /// Byte offset of the match.
    pub start: usize,
    /// Byte offset just past the match.
    pub end: usize,
    /// Parsed value; `None` when the token looks like money but does not
    /// normalize.
    pub money: Option<Money>,
}

/// Find money-like tokens in a piece of text.
///
/// A token counts only if it carries a currency symbol/code or decimals, so
/// bare integers (ids, years, tier numbers) and percentages are skipped.
pub fn find_money(text: &str) -> Vec<MoneyMatch<'_>> {
    let mut results = Vec::new();

    for caps in MONEY.captures_iter(text) {
        let Some(full) = caps.get(0) else {
            continue;
        };
        if text[full.end()..].trim_start().starts_with('%') {
            continue;
        }

        let has_currency = caps.name("cur").is_some() || caps.name("code").is_some();
        let has_decimals = caps.name("num").is_some_and(|n| {
            let digits = n.as_str();
            digits
                .rfind(['.', ','])
                .is_some_and(|i| (1..=2).contains(&(digits.len() - i - 1)))
        });
        if !has_currency && !has_decimals {
            continue;
        }

        // A lone "(" belongs to the surrounding text, not the amount.
        let mut start = full.start();
        if caps.name("open").is_some_and(|o| o.as_str() == "(") && caps.name("close").is_none() {
            start = text[start + 1..]
                .find(|c: char| !c.is_whitespace())
                .map_or(full.end(), |i| start + 1 + i);
        }

        let raw = text[start..full.end()].trim();
        results.push(MoneyMatch {
            raw,
            start,
            end: full.end(),
            money: parse_amount(raw),
        });
    }

    results
}

/// Whether the text contains at least one parseable amount.
pub fn has_money(text: &str) -> bool {
    find_money(text).iter().any(|m| m.money.is_some())
}

/// Amounts ending a line, left to right, at most `max` of them.
///
/// Returns the byte offset where the trailing amounts begin together with
/// the amounts. Only whitespace may separate consecutive trailing amounts.
pub fn trailing_amounts(line: &str, max: usize) -> (usize, Vec<Money>) {
    let line = line.trim_end();
    let matches = find_money(line);

    let mut boundary = line.len();
    let mut amounts = Vec::new();
    for m in matches.iter().rev() {
        if amounts.len() == max || !line[m.end..boundary].trim().is_empty() {
            break;
        }
        let Some(money) = m.money else {
            break;
        };
        amounts.push(money);
        boundary = m.start;
    }

    amounts.reverse();
    (boundary, amounts)
}

/// Parse a currency amount (e.g. "$1,234.56", "-$5.90", "(12.35)", "9,99 €").
///
/// Currency symbols, codes and thousands separators are dropped. When both
/// separators appear the last one is the decimal separator; a lone comma
/// followed by one or two digits is a decimal comma.
pub fn parse_amount(s: &str) -> Option<Money> {
    let trimmed = s.trim();
    let negative = trimmed.contains(['-', '\u{2013}', '\u{2212}'])
        || (trimmed.starts_with('(') && trimmed.ends_with(')'));

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(c), None) => {
            let decimals = cleaned.len() - c - 1;
            if cleaned.matches(',').count() == 1 && decimals <= 2 {
                cleaned.replace(',', ".")
            } else {
                thousands_only(&cleaned, ',')?
            }
        }
        (None, Some(_)) if cleaned.matches('.').count() > 1 => thousands_only(&cleaned, '.')?,
        _ => cleaned,
    };

    Decimal::from_str(&normalized)
        .ok()
        .map(|value| Money { value, negative })
}

/// Remove `sep` when it only ever groups digits by three.
fn thousands_only(digits: &str, sep: char) -> Option<String> {
    let mut groups = digits.split(sep);
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 || !groups.all(|g| g.len() == 3) {
        return None;
    }
    Some(digits.replace(sep, ""))
}

/// Format an amount with two decimals, as printed on the invoices.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}
