//! CSV table export.

use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;

use super::table::InvoiceRow;

/// Write rows with a header line.
pub fn write_rows<W: Write>(writer: W, rows: &[InvoiceRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        wtr.write_record(super::table::COLUMNS)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read rows back from a table written by [`write_rows`].
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<InvoiceRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let rows = rdr.deserialize().collect::<std::result::Result<Vec<InvoiceRow>, _>>()?;
    Ok(rows)
}

pub fn write_csv(path: &Path, rows: &[InvoiceRow]) -> Result<()> {
    write_rows(std::fs::File::create(path)?, rows)
}

pub fn read_csv(path: &Path) -> Result<Vec<InvoiceRow>> {
    read_rows(std::fs::File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::reconstruct;
    use crate::models::invoice::{InvoiceRecord, ParseOutcome, ParsedInvoice};
    use crate::sink::table::tests::sample_outcomes;
    use crate::sink::table::{table_rows, COLUMNS};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    #[test]
    fn test_header_and_quoting() {
        let rows = table_rows(&sample_outcomes());
        let mut out = Vec::new();
        write_rows(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(COLUMNS.join(",").as_str()));
        assert!(text.contains("\"Visa, ending in 4242\""));
        assert!(text.contains("\"Pixel \"\"Forge\"\"\""));
        assert!(text.contains(",53.10,"));
    }

    #[test]
    fn test_empty_table_has_header() {
        let mut out = Vec::new();
        write_rows(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim_end(), COLUMNS.join(","));
    }

    #[test]
    fn test_reimport_keeps_item_tuples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoices.csv");
        let rows = table_rows(&sample_outcomes());
        write_csv(&path, &rows).unwrap();

        let back = read_csv(&path).unwrap();
        let tuples = |rows: &[InvoiceRow]| -> BTreeSet<_> {
            rows.iter()
                .map(|r| (r.invoice_id.clone(), r.product_name.clone(), r.line_total))
                .collect()
        };
        assert_eq!(tuples(&back), tuples(&rows));
        assert_eq!(back, rows);
    }

    #[test]
    fn test_nameless_item_round_trips() {
        let table = reconstruct(&[
            "Product  Subtotal  Total",
            "$59.00  $53.10",
            "Total paid  $53.10",
        ]);
        assert_eq!(table.items[0].product_name, "");

        let outcome = ParseOutcome::Success(ParsedInvoice {
            source_file: "in/invoice-1004.pdf".to_string(),
            invoice: InvoiceRecord {
                invoice_id: Some("1004".to_string()),
                ..InvoiceRecord::default()
            },
            line_items: table.items,
            backend: "layout".to_string(),
            diagnostics: table.diagnostics,
        });
        let rows = table_rows(&[outcome]);
        assert_eq!(rows[0].product_name, None);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoices.csv");
        write_csv(&path, &rows).unwrap();
        assert_eq!(read_csv(&path).unwrap(), rows);
    }
}
