//! Transaction and category types shared by the categorizer and the ledger

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bookkeeping categories for a construction business
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Materials,
    Subcontractor,
    Equipment,
    Fuel,
    Office,
    Income,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Materials,
        Category::Subcontractor,
        Category::Equipment,
        Category::Fuel,
        Category::Office,
        Category::Income,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Materials => "Materials",
            Category::Subcontractor => "Subcontractor",
            Category::Equipment => "Equipment",
            Category::Fuel => "Fuel",
            Category::Office => "Office",
            Category::Income => "Income",
            Category::Other => "Other",
        }
    }

    /// Expense categories count toward spend reports; income does not
    pub fn is_expense(&self) -> bool {
        !matches!(self, Category::Income)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    /// Case-insensitive; accepts the exact serialized names only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown category: {s}"))
    }
}

/// Raw transaction fields handed to the categorizer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    /// Bank description of the transaction
    pub name: String,
    /// Negative = debit, positive = credit
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    /// ISO-8601 date, passed to the model verbatim
    pub date: String,
}

impl TransactionInput {
    pub fn new(name: impl Into<String>, amount: f64, date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount,
            merchant_name: None,
            date: date.into(),
        }
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant_name = Some(merchant.into());
        self
    }

    pub fn is_debit(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_credit(&self) -> bool {
        self.amount > 0.0
    }
}

/// One categorization result, from either the model or the keyword rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPrediction {
    pub category: Category,
    pub subcategory: String,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_project: Option<String>,
}

impl CategoryPrediction {
    pub fn new(
        category: Category,
        subcategory: impl Into<String>,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            category,
            subcategory: subcategory.into(),
            confidence,
            reasoning: reasoning.into(),
            suggested_project: None,
        }
    }

    pub fn has_valid_confidence(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }
}

/// A named group of vendor, material and trade keywords
#[derive(Debug, Clone, Copy)]
pub struct KeywordGroup {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

/// Construction vocabulary embedded in the categorization prompt
pub static CONSTRUCTION_KEYWORDS: [KeywordGroup; 5] = [
    KeywordGroup {
        label: "Materials",
        keywords: &[
            "Home Depot", "Lowe's", "Menards", "Sherwin-Williams", "Benjamin Moore",
            "lumber", "concrete", "steel", "roofing", "siding", "drywall", "insulation",
            "flooring", "tile", "paint", "hardware", "plumbing supplies", "electrical",
        ],
    },
    KeywordGroup {
        label: "Subcontractors",
        keywords: &[
            "plumbing", "electrical", "HVAC", "roofing", "flooring", "painting",
            "drywall", "landscaping", "concrete", "framing", "insulation", "tile",
        ],
    },
    KeywordGroup {
        label: "Equipment Rental",
        keywords: &[
            "United Rentals", "Home Depot Tool Rental", "Sunbelt", "Equipment Rental",
            "excavator", "bobcat", "forklift", "crane", "generator", "compressor",
        ],
    },
    KeywordGroup {
        label: "Fuel",
        keywords: &["Shell", "Chevron", "Exxon", "BP", "76", "Arco", "gas station", "fuel"],
    },
    KeywordGroup {
        label: "Office/Admin",
        keywords: &["office supplies", "software", "accounting", "legal", "insurance"],
    },
];
