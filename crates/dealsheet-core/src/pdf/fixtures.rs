//! Synthetic PDFs for tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// A text run placed at `(x, y)` in page space.
pub type Run<'a> = (f32, f32, &'a str);

/// Build a PDF with one page per entry, each run drawn in 10pt Courier.
pub fn runs_pdf(pages: &[Vec<Run<'_>>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for runs in pages {
        let mut operations = Vec::new();
        for (x, y, text) in runs {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
            operations.push(Operation::new(
                "Td",
                vec![Object::Real(*x as _), Object::Real(*y as _)],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Build a single-page PDF with one line of text per entry, top to bottom.
pub fn lines_pdf(lines: &[&str]) -> Vec<u8> {
    let runs = lines
        .iter()
        .enumerate()
        .map(|(i, line)| (50.0, 800.0 - 14.0 * i as f32, *line))
        .collect();
    runs_pdf(&[runs])
}

/// A one-page PDF whose Pages node names the page as its own parent.
pub fn cyclic_tree_pdf() -> Vec<u8> {
    let mut doc = Document::load_mem(&lines_pdf(&["Invoice ID: 1001"])).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let pages_id = doc
        .catalog()
        .unwrap()
        .get(b"Pages")
        .unwrap()
        .as_reference()
        .unwrap();
    doc.get_object_mut(pages_id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("Parent", page_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// The two-product invoice used across parser and batch tests.
pub const TWO_ITEM_INVOICE: &[&str] = &[
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

/// A single-product invoice whose line row only carries its subtotal.
pub const SINGLE_ITEM_INVOICE: &[&str] = &[
    "AppSumo",
    "Invoice ID: 2002",
    "Status: PAID",
    "Date: Jan. 3rd, 2023",
    "Payment type: PayPal",
    "Product  Subtotal",
    "Acme Writer  $123.45",
    "Invoice subtotal  $123.45",
    "Total applied plan discount  -$12.35",
    "Tax  $0.00",
];
