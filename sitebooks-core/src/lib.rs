//! sitebooks-core: transaction, category and ledger types for sitebooks

pub mod finance;
pub mod ledger;
pub mod project;

pub use finance::{
    CONSTRUCTION_KEYWORDS, Category, CategoryPrediction, KeywordGroup, TransactionInput,
};
pub use ledger::{CategorySpend, Ledger, TransactionRecord, TransactionStore};
pub use project::{BudgetStatus, NEAR_BUDGET_PCT, Project, ProjectSpend};
