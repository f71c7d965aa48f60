//! Invoice field extraction: field location, line items and the parser
//! that ties them to PDF text.

pub mod identifier;
pub mod items;
mod parser;
pub mod rules;

pub use identifier::{check_identifier, filename_id};
pub use items::{reconstruct, ItemTable};
pub use parser::{DealInvoiceParser, InvoiceParser, NO_FIELDS};
