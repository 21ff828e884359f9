//! Input checks for `append` and `rate_entity`.
//!
//! Validation collects every violation instead of stopping at the first, so
//! a vendor correcting a rejected bill sees all problems at once.

use serde::Serialize;

use crate::record::NewTransaction;

/// Longest accepted bill number.
pub const MAX_BILL_NUMBER_LEN: usize = 128;

/// Accepted rating range for a supply-chain hop.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Dotted path, e.g. `items[2].purchase_price`.
    pub field: String,
    pub message: String,
}

/// All violations found in one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport(Vec<FieldViolation>);

impl ValidationReport {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub(crate) fn single(field: &str, message: impl Into<String>) -> Self {
        let mut report = Self::default();
        report.push(field, message);
        report
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", v.field, v.message)?;
        }
        Ok(())
    }
}

fn require_text(report: &mut ValidationReport, field: String, value: &str) {
    if value.trim().is_empty() {
        report.push(field, "is required");
    }
}

fn require_non_negative(report: &mut ValidationReport, field: String, value: i64) {
    if value < 0 {
        report.push(field, format!("must be >= 0, got {value}"));
    }
}

/// Check a new transaction before it is chained.
pub fn validate_new_transaction(tx: &NewTransaction) -> Result<(), ValidationReport> {
    let mut report = ValidationReport::default();

    require_text(&mut report, "bill_number".into(), &tx.bill_number);
    if tx.bill_number.chars().count() > MAX_BILL_NUMBER_LEN {
        report.push(
            "bill_number",
            format!("must not exceed {MAX_BILL_NUMBER_LEN} characters"),
        );
    }
    require_non_negative(&mut report, "total_amount".into(), tx.total_amount);

    for (i, hop) in tx.supply_chain.iter().enumerate() {
        let at = |name: &str| format!("supply_chain[{i}].{name}");
        require_text(&mut report, at("entity_name"), &hop.entity_name);
        require_text(&mut report, at("unit"), &hop.unit);
        require_non_negative(&mut report, at("price"), hop.price);
        require_non_negative(&mut report, at("quantity"), hop.quantity);
        if let Some(rating) = hop.rating {
            if !RATING_RANGE.contains(&rating) {
                report.push(at("rating"), format!("must be between 1 and 5, got {rating}"));
            }
        }
    }

    for (i, item) in tx.items.iter().enumerate() {
        let at = |name: &str| format!("items[{i}].{name}");
        require_text(&mut report, at("product_name"), &item.product_name);
        require_text(&mut report, at("unit"), &item.unit);
        require_non_negative(&mut report, at("quantity"), item.quantity);
        require_non_negative(&mut report, at("purchase_price"), item.purchase_price);
        if let Some(selling) = item.selling_price {
            require_non_negative(&mut report, at("selling_price"), selling);
        }
    }

    report.into_result()
}

/// Check a rating value.
pub fn validate_rating(rating: u8) -> Result<(), ValidationReport> {
    if RATING_RANGE.contains(&rating) {
        Ok(())
    } else {
        Err(ValidationReport::single(
            "rating",
            format!("must be between 1 and 5, got {rating}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::new_tx;

    fn fields(report: &ValidationReport) -> Vec<&str> {
        report.violations().iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn well_formed_bill_passes() {
        assert!(validate_new_transaction(&new_tx("B-1", 100)).is_ok());
    }

    #[test]
    fn zero_total_is_allowed() {
        assert!(validate_new_transaction(&new_tx("B-1", 0)).is_ok());
    }

    #[test]
    fn empty_hops_and_items_are_allowed() {
        let mut tx = new_tx("B-1", 0);
        tx.supply_chain.clear();
        tx.items.clear();
        assert!(validate_new_transaction(&tx).is_ok());
    }

    #[test]
    fn negative_total_rejected() {
        let report = validate_new_transaction(&new_tx("B-1", -1)).unwrap_err();
        assert_eq!(fields(&report), vec!["total_amount"]);
        assert!(report.to_string().contains("must be >= 0, got -1"));
    }

    #[test]
    fn all_violations_are_collected() {
        let mut tx = new_tx("   ", -5);
        tx.supply_chain[0].price = -1;
        tx.supply_chain[1].quantity = -10;
        tx.supply_chain[1].entity_name = String::new();
        tx.supply_chain[0].rating = Some(6);
        tx.items[0].purchase_price = -3;
        tx.items[0].selling_price = Some(-4);
        tx.items[0].unit = "".to_string();
        let report = validate_new_transaction(&tx).unwrap_err();
        assert_eq!(
            fields(&report),
            vec![
                "bill_number",
                "total_amount",
                "supply_chain[0].price",
                "supply_chain[0].rating",
                "supply_chain[1].entity_name",
                "supply_chain[1].quantity",
                "items[0].unit",
                "items[0].purchase_price",
                "items[0].selling_price",
            ]
        );
    }

    #[test]
    fn overlong_bill_number_rejected() {
        let tx = new_tx(&"9".repeat(MAX_BILL_NUMBER_LEN + 1), 10);
        let report = validate_new_transaction(&tx).unwrap_err();
        assert_eq!(fields(&report), vec!["bill_number"]);
    }

    #[test]
    fn bill_number_limit_counts_characters_not_bytes() {
        let devanagari = "क".repeat(MAX_BILL_NUMBER_LEN);
        assert!(devanagari.len() > MAX_BILL_NUMBER_LEN);
        assert!(validate_new_transaction(&new_tx(&devanagari, 10)).is_ok());

        let over = "क".repeat(MAX_BILL_NUMBER_LEN + 1);
        assert!(validate_new_transaction(&new_tx(&over, 10)).is_err());
    }

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }
}
