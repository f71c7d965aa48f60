use std::path::Path;

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;

const INVOICE_1001: &[&str] = &[
    "AppSumo",
    "Invoice ID: 1001",
    "Status: PAID",
    "Date: March 5, 2024",
    "Payment type: Visa ending in 4242",
    "Product  Deal plan  Subtotal  Plan discount  Total",
    "Acme Writer  License Tier 1  $59.00  -$5.90  $53.10",
    "Pixel Forge  Single code  $49.00  -$4.90  $44.10",
    "Invoice subtotal  $108.00",
    "Total applied plan discount  -$10.80",
    "Tax  $0.00",
    "Total paid  $97.20",
];

/// One page of Courier text, one line per entry.
fn write_pdf(path: &Path, lines: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
        operations.push(Operation::new("Td", vec![50.into(), (800 - 14 * i as i64).into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn dealsheet() -> Command {
    Command::cargo_bin("dealsheet").unwrap()
}

#[test]
fn process_prints_json() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("invoice-1001.pdf");
    write_pdf(&pdf, INVOICE_1001);

    dealsheet()
        .arg("process")
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"invoice_id\": \"1001\""))
        .stdout(predicate::str::contains("Pixel Forge"));
}

#[test]
fn process_text_format() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("invoice-1001.pdf");
    write_pdf(&pdf, INVOICE_1001);

    dealsheet()
        .args(["process", "--format", "text"])
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total paid: 97.20"));
}

#[test]
fn process_missing_file_fails() {
    dealsheet()
        .args(["process", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn batch_writes_table_and_log() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    std::fs::create_dir(&input).unwrap();
    write_pdf(&input.join("invoice-1001.pdf"), INVOICE_1001);
    std::fs::write(input.join("invoice-1002.pdf"), b"not a pdf").unwrap();

    let table = dir.path().join("out").join("invoices.csv");
    let log = dir.path().join("status.csv");

    dealsheet()
        .arg("batch")
        .arg(&input)
        .arg("--output")
        .arg(&table)
        .arg("--log")
        .arg(&log)
        .args(["--jobs", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful"))
        .stdout(predicate::str::contains("1 failed"));

    let table = std::fs::read_to_string(&table).unwrap();
    let mut lines = table.lines();
    assert!(lines.next().unwrap().starts_with("invoice_id,invoice_status,invoice_date"));
    assert_eq!(lines.count(), 2);

    let log = std::fs::read_to_string(&log).unwrap();
    assert!(log.starts_with("source_file,outcome,invoice_id,line_items,backend,note"));
    assert!(log.contains(",success,1001,2,layout,"));
    assert!(log.contains(",failure,,0,,"));
}

#[test]
fn batch_xlsx_with_csv_copy() {
    let dir = tempfile::tempdir().unwrap();
    write_pdf(&dir.path().join("invoice-1001.pdf"), INVOICE_1001);
    let table = dir.path().join("invoices.xlsx");

    dealsheet()
        .arg("batch")
        .arg(dir.path().join("*.pdf").to_string_lossy().into_owned())
        .arg("--output")
        .arg(&table)
        .arg("--also-csv")
        .assert()
        .success();

    assert!(table.exists());
    assert!(dir.path().join("invoices.csv").exists());
    assert!(dir.path().join("invoices.status.csv").exists());
}

#[test]
fn batch_without_inputs_fails() {
    let dir = tempfile::tempdir().unwrap();

    dealsheet()
        .arg("batch")
        .arg(dir.path())
        .arg("--output")
        .arg(dir.path().join("t.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No PDF files found"));
}

#[test]
fn config_get_and_set() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");

    dealsheet()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "batch.workers", "3"])
        .assert()
        .success();

    dealsheet()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "batch.workers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));

    dealsheet()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "batch.nope", "1"])
        .assert()
        .failure();
}
