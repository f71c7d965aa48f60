//! Line item reconstruction from the product table.
//!
//! The table sits between a header line ("Product ...") and the first line
//! of the totals block. Two layouts are handled: tabular rows that carry
//! their amounts at the end of the line, and vertical blocks where each
//! product is followed by labelled `Deal plan:` / `Subtotal` /
//! `Plan discount` / `Total` rows. A label may carry its amount on the
//! following line.

use regex::Regex;
use rust_decimal::Decimal;
use tracing::trace;

use super::rules::patterns::{
    COLUMN_GAP, DEAL_PLAN_ROW, DISCOUNT_ROW, SUBTOTAL_ROW, TABLE_END, TABLE_HEADER,
    TABLE_HEADER_COLUMN, TOTAL_ROW,
};
use super::rules::{is_field_label, trailing_amounts, Money};
use crate::error::Diagnostic;
use crate::models::invoice::LineItemRecord;

/// Most amounts a tabular row carries: subtotal, discount, total.
const MAX_ROW_AMOUNTS: usize = 3;

/// Line items plus any layout problems found while reading them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemTable {
    pub items: Vec<LineItemRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Amount columns named by the table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Subtotal,
    Discount,
    Total,
}

/// Whether the line opens the product table.
pub fn is_table_header(line: &str) -> bool {
    TABLE_HEADER.captures(line).is_some_and(|caps| {
        let rest = caps.name("rest").map_or("", |m| m.as_str());
        rest.trim().is_empty() || TABLE_HEADER_COLUMN.is_match(rest)
    })
}

fn header_columns(header: &str) -> Vec<Column> {
    let rest = TABLE_HEADER
        .captures(header)
        .and_then(|caps| caps.name("rest"))
        .map_or("", |m| m.as_str());
    TABLE_HEADER_COLUMN
        .find_iter(rest)
        .filter_map(|m| {
            let name = m.as_str().to_ascii_lowercase();
            if name.contains("discount") {
                Some(Column::Discount)
            } else if name == "total" {
                Some(Column::Total)
            } else if name.starts_with("deal") {
                None
            } else {
                Some(Column::Subtotal)
            }
        })
        .collect()
}

/// Rebuild line items from the extracted lines.
pub fn reconstruct(lines: &[&str]) -> ItemTable {
    let mut table = ItemTable::default();

    let Some(start) = lines.iter().position(|l| is_table_header(l)) else {
        table
            .diagnostics
            .push(Diagnostic::LayoutMismatch("line item table header not found".to_string()));
        return table;
    };
    let Some(end) = lines[start + 1..]
        .iter()
        .position(|l| TABLE_END.is_match(l))
        .map(|i| start + 1 + i)
    else {
        table
            .diagnostics
            .push(Diagnostic::LayoutMismatch("line item table end not found".to_string()));
        return table;
    };
    trace!("Item table spans lines {}..{}", start, end);

    let mut builder = Builder::new(header_columns(lines[start]));
    for row in &lines[start + 1..end] {
        builder.row(row);
    }
    let (items, held) = builder.finish();
    table.items = items;

    if held > 0 {
        table.diagnostics.push(Diagnostic::LayoutMismatch(format!(
            "{} description row(s) not attached to any item",
            held
        )));
    }
    if table.items.is_empty() {
        table
            .diagnostics
            .push(Diagnostic::LayoutMismatch("no line items between table anchors".to_string()));
    }

    let stranded = (end + 1..lines.len())
        .filter(|&i| is_item_like(lines[i]) && !is_label_value(lines[i], lines[i - 1]))
        .count();
    if stranded > 0 {
        table.diagnostics.push(Diagnostic::LayoutMismatch(format!(
            "{} item-like row(s) after the totals block",
            stranded
        )));
    }

    table
}

/// A row with trailing money that is not an invoice-level label.
fn is_item_like(line: &str) -> bool {
    !TABLE_END.is_match(line)
        && !is_field_label(line)
        && !trailing_amounts(line, MAX_ROW_AMOUNTS).1.is_empty()
}

/// A row holding money and nothing else.
fn is_amount_only(line: &str) -> bool {
    let (boundary, amounts) = trailing_amounts(line, MAX_ROW_AMOUNTS);
    !amounts.is_empty() && line[..boundary].trim().is_empty()
}

/// An amount-only row under an invoice-level label is that label's value.
fn is_label_value(line: &str, previous: &str) -> bool {
    is_amount_only(line) && (TABLE_END.is_match(previous) || is_field_label(previous))
}

/// The attribute named by a row holding only a label such as `Subtotal:`.
fn bare_label(row: &str) -> Option<Column> {
    let labels: [(&Regex, Column); 3] = [
        (&*SUBTOTAL_ROW, Column::Subtotal),
        (&*DISCOUNT_ROW, Column::Discount),
        (&*TOTAL_ROW, Column::Total),
    ];
    labels.into_iter().find_map(|(pattern, column)| {
        let label = pattern.find(row)?;
        let rest = row[label.end()..].trim_start().trim_start_matches(':');
        rest.trim().is_empty().then_some(column)
    })
}

/// Split the descriptive part of a tabular row into name and deal plan.
fn split_columns(text: &str) -> (String, Option<String>) {
    let mut segments = COLUMN_GAP
        .split(text.trim())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let name = segments.next().unwrap_or_default().to_string();
    let plan = segments.next().map(str::to_string);
    (name, plan)
}

fn join_description(parts: &[String], tail: &str) -> String {
    parts
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(tail))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

struct Builder {
    columns: Vec<Column>,
    items: Vec<LineItemRecord>,
    open: Option<LineItemRecord>,
    /// A labelled total closed the open item.
    sealed: bool,
    held: Vec<String>,
    /// A bare label waiting for its amount on the next row.
    pending: Option<Column>,
}

impl Builder {
    fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            items: Vec::new(),
            open: None,
            sealed: false,
            held: Vec::new(),
            pending: None,
        }
    }

    fn row(&mut self, row: &str) {
        let row = row.trim();
        if row.is_empty() {
            return;
        }

        let (boundary, amounts) = trailing_amounts(row, MAX_ROW_AMOUNTS);
        if let Some(column) = self.pending.take() {
            if let Some(last) = amounts.last() {
                if row[..boundary].trim().is_empty() {
                    self.set(column, last.value);
                    return;
                }
            }
        }

        if let Some(caps) = DEAL_PLAN_ROW.captures(row) {
            let plan = caps["value"].trim();
            if !plan.is_empty() {
                self.attribute().deal_plan = Some(plan.to_string());
            }
            return;
        }

        if let Some(last) = amounts.last().copied() {
            if SUBTOTAL_ROW.is_match(row) {
                self.set(Column::Subtotal, last.value);
            } else if DISCOUNT_ROW.is_match(row) {
                self.set(Column::Discount, last.value);
            } else if TOTAL_ROW.is_match(row) {
                self.set(Column::Total, last.value);
            } else {
                self.start_tabular(&row[..boundary], &amounts);
            }
            return;
        }

        if let Some(column) = bare_label(row) {
            self.pending = Some(column);
            return;
        }

        match self.open.as_mut() {
            Some(item) if !self.sealed => {
                item.product_name = join_description(&[item.product_name.clone()], row);
            }
            _ => self.held.push(row.to_string()),
        }
    }

    /// Record a labelled amount; a total closes the item.
    fn set(&mut self, column: Column, value: Decimal) {
        let item = self.attribute();
        match column {
            Column::Subtotal => item.subtotal = Some(value),
            Column::Discount => item.plan_discount = Some(value),
            Column::Total => {
                item.total = Some(value);
                self.sealed = true;
            }
        }
    }

    /// The item a labelled attribute row belongs to, opening one from the
    /// held description when needed.
    fn attribute(&mut self) -> &mut LineItemRecord {
        if self.open.is_none() || self.sealed {
            self.close();
            let name = join_description(&std::mem::take(&mut self.held), "");
            self.open = Some(LineItemRecord::named(name));
        }
        self.open.get_or_insert_with(LineItemRecord::default)
    }

    fn start_tabular(&mut self, text: &str, amounts: &[Money]) {
        self.close();

        let (name, deal_plan) = split_columns(text);
        let description = join_description(&std::mem::take(&mut self.held), &name);
        let mut item = LineItemRecord::named(description);
        item.deal_plan = deal_plan;
        self.assign_amounts(&mut item, amounts);

        self.open = Some(item);
    }

    fn assign_amounts(&self, item: &mut LineItemRecord, amounts: &[Money]) {
        if self.columns.len() == amounts.len() {
            for (column, money) in self.columns.iter().zip(amounts) {
                match column {
                    Column::Subtotal => item.subtotal = Some(money.value),
                    Column::Discount => item.plan_discount = Some(money.value),
                    Column::Total => item.total = Some(money.value),
                }
            }
            return;
        }

        let mut positives: Vec<Decimal> = Vec::new();
        for money in amounts {
            if money.negative {
                item.plan_discount = Some(money.value);
            } else {
                positives.push(money.value);
            }
        }
        let mut positives = positives.into_iter();
        item.subtotal = positives.next();
        item.total = positives.next();
    }

    fn close(&mut self) {
        if let Some(item) = self.open.take() {
            self.items.push(item);
        }
        self.sealed = false;
    }

    /// Finished items and the number of rows left unattached.
    fn finish(mut self) -> (Vec<LineItemRecord>, usize) {
        self.close();
        (self.items, self.held.len())
    }
}
