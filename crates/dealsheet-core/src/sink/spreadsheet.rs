//! XLSX table export.

use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};

use crate::error::Result;

use super::table::{Cell, InvoiceRow, COLUMNS};

/// Worksheet holding the table.
pub const SHEET_NAME: &str = "invoices";

/// Write rows to a workbook; amounts become numeric cells.
pub fn write_xlsx(path: &Path, rows: &[InvoiceRow]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let amount = Format::new().set_num_format("0.00");

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, cell) in row.cells().into_iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    sheet.write_string(r, col, text)?;
                }
                Cell::Number(value) => {
                    let value = value.to_f64().unwrap_or_default();
                    sheet.write_number_with_format(r, col, value, &amount)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}
