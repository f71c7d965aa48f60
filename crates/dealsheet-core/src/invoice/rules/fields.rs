//! The field table: labels, scopes and value kinds per invoice field.

use lazy_static::lazy_static;

use super::patterns::*;
use super::{FieldSpec, Label, SearchScope, ValueKind};
use crate::models::invoice::Field;

fn label(pattern: &'static regex::Regex, scope: SearchScope) -> Label {
    Label { pattern, scope }
}

lazy_static! {
    /// One spec per field, in output column order.
    pub static ref FIELD_SPECS: Vec<FieldSpec> = vec![
        FieldSpec {
            field: Field::InvoiceId,
            kind: ValueKind::Identifier,
            labels: vec![
                label(&INVOICE_ID_LABEL, SearchScope::NextLine),
                label(&INVOICE_HASH_LABEL, SearchScope::SameLine),
                label(&INVOICE_NUMBER_LABEL, SearchScope::NextLine),
            ],
        },
        FieldSpec {
            field: Field::Status,
            kind: ValueKind::Status,
            labels: vec![label(&STATUS_LABEL, SearchScope::NextLine)],
        },
        FieldSpec {
            field: Field::Date,
            kind: ValueKind::Date,
            labels: vec![
                label(&DATE_LABEL, SearchScope::NextLine),
                label(&INVOICE_DATE_LABEL, SearchScope::NextLine),
                label(&DATE_PAID_LABEL, SearchScope::NextLine),
            ],
        },
        FieldSpec {
            field: Field::PaymentType,
            kind: ValueKind::Text,
            labels: vec![
                label(&PAYMENT_TYPE_LABEL, SearchScope::NextLine),
                label(&PAYMENT_METHOD_LABEL, SearchScope::NextLine),
            ],
        },
        FieldSpec {
            field: Field::TaxId,
            kind: ValueKind::Text,
            labels: vec![label(&TAX_ID_LABEL, SearchScope::SameLine)],
        },
        FieldSpec {
            field: Field::Subtotal,
            kind: ValueKind::Amount,
            labels: vec![label(&INVOICE_SUBTOTAL_LABEL, SearchScope::NextLine)],
        },
        FieldSpec {
            field: Field::PlanDiscountTotal,
            kind: ValueKind::Amount,
            labels: vec![label(&PLAN_DISCOUNT_TOTAL_LABEL, SearchScope::NextLine)],
        },
        FieldSpec {
            field: Field::Tax,
            kind: ValueKind::Amount,
            labels: vec![
                label(&TAX_LABEL, SearchScope::NextLine),
                label(&SALES_TAX_LABEL, SearchScope::Window(1)),
            ],
        },
        FieldSpec {
            field: Field::TotalPaid,
            kind: ValueKind::Amount,
            labels: vec![
                label(&TOTAL_PAID_LABEL, SearchScope::NextLine),
                label(&AMOUNT_PAID_LABEL, SearchScope::Window(1)),
            ],
        },
    ];
}

/// The spec for one field.
pub fn spec_for(field: Field) -> &'static FieldSpec {
    FIELD_SPECS
        .iter()
        .find(|spec| spec.field == field)
        .unwrap_or_else(|| unreachable!("every field has a spec"))
}

/// Whether a line carries any invoice-level field label.
pub fn is_field_label(line: &str) -> bool {
    FIELD_SPECS
        .iter()
        .flat_map(|spec| spec.labels.iter())
        .any(|label| label.pattern.is_match(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_a_spec() {
        for field in Field::ALL {
            assert_eq!(spec_for(field).field, field);
        }
        assert_eq!(FIELD_SPECS.len(), Field::ALL.len());
    }

    #[test]
    fn test_is_field_label() {
        assert!(is_field_label("Total paid  $97.20"));
        assert!(is_field_label("Sales tax (5%)  $1.00"));
        assert!(!is_field_label("Acme Writer  $53.10"));
    }
}
