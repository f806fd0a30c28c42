//! Deterministic keyword rules used when the model can't be reached.
//!
//! First matching rule wins; there is no scoring across rules.

use sitebooks_core::{Category, CategoryPrediction, TransactionInput};

const HARDWARE_STORES: &[&str] = &["home depot", "lowes", "menards"];
const PAINT: &[&str] = &["sherwin", "benjamin moore", "paint"];
const EQUIPMENT_RENTAL: &[&str] = &["united rentals", "sunbelt", "rental"];
const FUEL: &[&str] = &["shell", "chevron", "exxon", "bp", "76", "gas"];
const TRADES: &[&str] = &["plumbing", "electrical", "hvac", "roofing"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Categorize from the transaction name and amount sign alone.
pub fn classify_by_rules(txn: &TransactionInput) -> CategoryPrediction {
    let name = txn.name.to_lowercase();

    if contains_any(&name, HARDWARE_STORES) {
        return pred(Category::Materials, "Hardware Store", 0.9, "Major home improvement retailer");
    }

    if contains_any(&name, PAINT) {
        return pred(
            Category::Materials,
            "Paint & Finishes",
            0.85,
            "Paint retailer or paint-related purchase",
        );
    }

    if contains_any(&name, EQUIPMENT_RENTAL) {
        return pred(Category::Equipment, "Equipment Rental", 0.9, "Equipment rental company");
    }

    // Plain substring checks: "bp" and "76" match inside longer tokens too.
    if contains_any(&name, FUEL) {
        return pred(Category::Fuel, "Vehicle Fuel", 0.85, "Gas station or fuel purchase");
    }

    if txn.is_debit() && contains_any(&name, TRADES) {
        return pred(
            Category::Subcontractor,
            "Trade Services",
            0.8,
            "Trade-specific service provider",
        );
    }

    if txn.is_credit() {
        return pred(
            Category::Income,
            "Client Payment",
            0.7,
            "Positive amount, likely client payment",
        );
    }

    pred(
        Category::Other,
        "Uncategorized",
        0.1,
        "Could not determine category from available information",
    )
}

fn pred(category: Category, subcategory: &str, confidence: f64, reasoning: &str) -> CategoryPrediction {
    CategoryPrediction::new(category, subcategory, confidence, reasoning)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(name: &str, amount: f64) -> TransactionInput {
        TransactionInput::new(name, amount, "2024-01-15")
    }

    #[test]
    fn test_home_depot_is_hardware_store() {
        let p = classify_by_rules(&txn("Home Depot #4532", -1249.99));
        assert_eq!(
            p,
            CategoryPrediction::new(
                Category::Materials,
                "Hardware Store",
                0.9,
                "Major home improvement retailer"
            )
        );
        assert_eq!(p.suggested_project, None);
    }

    #[test]
    fn test_client_payment_is_income() {
        let p = classify_by_rules(&TransactionInput::new("Client Payment - Johnson", 15000.0, "2024-01-12"));
        assert_eq!(p.category, Category::Income);
        assert_eq!(p.subcategory, "Client Payment");
        assert_eq!(p.confidence, 0.7);
        assert_eq!(p.reasoning, "Positive amount, likely client payment");
    }

    #[test]
    fn test_unknown_debit_is_other() {
        let p = classify_by_rules(&TransactionInput::new("Random Vendor XYZ", -50.0, "2024-01-01"));
        assert_eq!(p.category, Category::Other);
        assert_eq!(p.subcategory, "Uncategorized");
        assert_eq!(p.confidence, 0.1);
        assert_eq!(p.reasoning, "Could not determine category from available information");
    }

    #[test]
    fn test_zero_amount_is_other() {
        assert_eq!(classify_by_rules(&txn("Adjustment", 0.0)).category, Category::Other);
    }

    #[test]
    fn test_earlier_rules_win() {
        // hardware store beats fuel
        let p = classify_by_rules(&txn("HOME DEPOT GAS STATION", -80.0));
        assert_eq!(p.subcategory, "Hardware Store");

        // paint beats rental
        let p = classify_by_rules(&txn("Paint sprayer rental", -45.0));
        assert_eq!(p.subcategory, "Paint & Finishes");

        // rental beats fuel
        let p = classify_by_rules(&txn("Sunbelt Rentals Shell Rd", -300.0));
        assert_eq!(p.category, Category::Equipment);

        // fuel beats trades
        let p = classify_by_rules(&txn("Chevron electrical", -20.0));
        assert_eq!(p.category, Category::Fuel);
    }

    #[test]
    fn test_each_rule_fires() {
        let cases = [
            ("MENARDS 3321", -10.0, Category::Materials, "Hardware Store", 0.9),
            ("Sherwin-Williams #88", -10.0, Category::Materials, "Paint & Finishes", 0.85),
            ("United Rentals", -10.0, Category::Equipment, "Equipment Rental", 0.9),
            ("EXXONMOBIL 4471", -10.0, Category::Fuel, "Vehicle Fuel", 0.85),
            ("ACE PLUMBING LLC", -10.0, Category::Subcontractor, "Trade Services", 0.8),
            ("Wire transfer in", 10.0, Category::Income, "Client Payment", 0.7),
        ];
        for (name, amount, category, sub, conf) in cases {
            let p = classify_by_rules(&txn(name, amount));
            assert_eq!(p.category, category, "{name}");
            assert_eq!(p.subcategory, sub, "{name}");
            assert_eq!(p.confidence, conf, "{name}");
        }
    }

    #[test]
    fn test_trade_credit_is_income_not_subcontractor() {
        let p = classify_by_rules(&txn("Roofing deposit refund", 500.0));
        assert_eq!(p.category, Category::Income);
    }

    #[test]
    fn test_substring_quirks_are_kept() {
        // "lowe's" with an apostrophe does not match "lowes"
        let p = classify_by_rules(&txn("LOWE'S #1010", -75.0));
        assert_eq!(p.category, Category::Other);

        // "bp" inside another word still reads as fuel
        let p = classify_by_rules(&txn("SUBPANEL KIT", -75.0));
        assert_eq!(p.category, Category::Fuel);
    }

    #[test]
    fn test_merchant_does_not_drive_rules() {
        let t = txn("POS DEBIT 0042", -60.0).with_merchant("Home Depot");
        assert_eq!(classify_by_rules(&t).category, Category::Other);
    }

    #[test]
    fn test_deterministic() {
        let t = txn("Shell Oil 5521", -62.10);
        let first = classify_by_rules(&t);
        for _ in 0..5 {
            assert_eq!(classify_by_rules(&t), first);
        }
    }

    #[test]
    fn test_confidence_always_in_range() {
        for name in ["", "x", "home depot", "gas", "hvac", "rental", "paint"] {
            for amount in [-1.0, 0.0, 1.0] {
                assert!(classify_by_rules(&txn(name, amount)).has_valid_confidence());
            }
        }
    }
}
