//! JSON-file ledger of imported transactions.
//!
//! Stores category results written back by the categorizer, hands out
//! the next batch of uncategorized records (newest first) and tracks spend
//! against project budgets.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::finance::{Category, CategoryPrediction, TransactionInput};
use crate::project::{Project, ProjectSpend};

/// A persisted bank transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    /// Opaque id from the bank export; unique within a ledger
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    #[serde(default)]
    pub merchant_name: Option<String>,
    /// Positive = income, negative = expense
    pub amount: f64,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub ai_categorized: bool,
    /// Id of the project this spend is charged to
    #[serde(default)]
    pub project: Option<String>,
    /// Project type the categorizer thought this looked like (Kitchen, Deck, ...)
    #[serde(default)]
    pub suggested_project: Option<String>,
}

impl TransactionRecord {
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        name: impl Into<String>,
        amount: f64,
        account: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            name: name.into(),
            merchant_name: None,
            amount,
            account: account.into(),
            category: None,
            subcategory: None,
            ai_categorized: false,
            project: None,
            suggested_project: None,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    pub fn needs_category(&self) -> bool {
        self.category.is_none() && !self.ai_categorized
    }

    /// Fields the categorizer sees
    pub fn to_input(&self) -> TransactionInput {
        TransactionInput {
            name: self.name.clone(),
            amount: self.amount,
            merchant_name: self.merchant_name.clone(),
            date: self.date.to_string(),
        }
    }
}

/// Expense total for one category bucket (`None` = not yet categorized)
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySpend {
    pub category: Option<Category>,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a ledger file; a missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TransactionRecord> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Add records whose id is not already present. Returns how many were added.
    pub fn insert_new(&mut self, records: impl IntoIterator<Item = TransactionRecord>) -> usize {
        let mut seen: HashSet<String> = self.transactions.iter().map(|t| t.id.clone()).collect();
        let mut added = 0;
        for r in records {
            if seen.contains(&r.id) {
                debug!(id = %r.id, "skipping existing transaction");
                continue;
            }
            seen.insert(r.id.clone());
            self.transactions.push(r);
            added += 1;
        }
        added
    }

    /// Records still waiting for a category, most recent first.
    pub fn uncategorized(&self, limit: usize) -> Vec<&TransactionRecord> {
        let mut pending: Vec<&TransactionRecord> =
            self.transactions.iter().filter(|t| t.needs_category()).collect();
        pending.sort_by(|a, b| b.date.cmp(&a.date));
        pending.truncate(limit);
        pending
    }

    pub fn uncategorized_count(&self) -> usize {
        self.transactions.iter().filter(|t| t.needs_category()).count()
    }

    /// Write a categorizer result back onto a record and mark it AI-categorized.
    pub fn apply_prediction(&mut self, id: &str, prediction: &CategoryPrediction) -> Result<()> {
        let Some(record) = self.transactions.iter_mut().find(|t| t.id == id) else {
            bail!("transaction not found: {id}");
        };
        record.category = Some(prediction.category);
        record.subcategory = Some(prediction.subcategory.clone());
        record.suggested_project = prediction.suggested_project.clone();
        record.ai_categorized = true;
        Ok(())
    }

    /// Manual edit; leaves the AI flag untouched.
    pub fn set_category(
        &mut self,
        id: &str,
        category: Category,
        subcategory: Option<String>,
    ) -> Result<()> {
        let Some(record) = self.transactions.iter_mut().find(|t| t.id == id) else {
            bail!("transaction not found: {id}");
        };
        record.category = Some(category);
        record.subcategory = subcategory;
        Ok(())
    }

    /// Expense totals per category, largest first.
    pub fn spend_by_category(&self) -> Vec<CategorySpend> {
        let mut groups: BTreeMap<Option<Category>, (f64, usize)> = BTreeMap::new();
        for t in self.transactions.iter().filter(|t| t.is_expense()) {
            let entry = groups.entry(t.category).or_insert((0.0, 0));
            entry.0 += t.amount.abs();
            entry.1 += 1;
        }

        let mut out: Vec<CategorySpend> = groups
            .into_iter()
            .map(|(category, (total, count))| CategorySpend { category, total, count })
            .collect();
        out.sort_by(|a, b| b.total.total_cmp(&a.total));
        out
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Register a project. Ids are unique and budgets must be positive.
    pub fn add_project(&mut self, project: Project) -> Result<()> {
        if project.id.trim().is_empty() {
            bail!("project id must not be empty");
        }
        if !(project.budget.is_finite() && project.budget > 0.0) {
            bail!("project budget must be positive, got {}", project.budget);
        }
        if self.project(&project.id).is_some() {
            bail!("project already exists: {}", project.id);
        }
        debug!(id = %project.id, budget = project.budget, "adding project");
        self.projects.push(project);
        Ok(())
    }

    /// Charge a transaction to a project, or clear the assignment with `None`.
    pub fn assign_project(&mut self, id: &str, project_id: Option<&str>) -> Result<()> {
        if let Some(pid) = project_id {
            if self.project(pid).is_none() {
                bail!("project not found: {pid}");
            }
        }
        let Some(record) = self.transactions.iter_mut().find(|t| t.id == id) else {
            bail!("transaction not found: {id}");
        };
        record.project = project_id.map(str::to_string);
        Ok(())
    }

    /// Budget position of every project, in the order they were added.
    /// Only expenses count toward spend.
    pub fn project_report(&self) -> Vec<ProjectSpend> {
        let mut spent: HashMap<&str, (f64, usize)> = HashMap::new();
        for t in self.transactions.iter().filter(|t| t.is_expense()) {
            if let Some(pid) = t.project.as_deref() {
                let entry = spent.entry(pid).or_insert((0.0, 0));
                entry.0 += t.amount.abs();
                entry.1 += 1;
            }
        }

        self.projects
            .iter()
            .map(|p| {
                let (total, count) = spent.get(p.id.as_str()).copied().unwrap_or((0.0, 0));
                ProjectSpend::new(p, total, count)
            })
            .collect()
    }
}

/// Persistence seam used by the batch categorizer
pub trait TransactionStore {
    /// Up to `limit` transactions lacking a category, most recent first.
    fn pending(&self, limit: usize) -> Vec<(String, TransactionInput)>;

    /// Persist a prediction for the transaction keyed by `id`.
    fn record_prediction(&mut self, id: &str, prediction: &CategoryPrediction) -> Result<()>;
}

impl TransactionStore for Ledger {
    fn pending(&self, limit: usize) -> Vec<(String, TransactionInput)> {
        self.uncategorized(limit)
            .into_iter()
            .map(|t| (t.id.clone(), t.to_input()))
            .collect()
    }

    fn record_prediction(&mut self, id: &str, prediction: &CategoryPrediction) -> Result<()> {
        self.apply_prediction(id, prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::BudgetStatus;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample() -> Ledger {
        let mut l = Ledger::new();
        l.insert_new(vec![
            TransactionRecord::new("t1", day(3), "Home Depot #4532", -1249.99, "Checking"),
            TransactionRecord::new("t2", day(12), "Client Payment - Johnson", 15000.0, "Checking"),
            TransactionRecord::new("t3", day(8), "Shell Oil 5521", -62.10, "Checking"),
            TransactionRecord::new("t4", day(1), "Random Vendor XYZ", -50.0, "Checking"),
        ]);
        l
    }

    #[test]
    fn test_insert_new_skips_existing_ids() {
        let mut l = sample();
        let added = l.insert_new(vec![
            TransactionRecord::new("t1", day(3), "dupe", -1.0, "Checking"),
            TransactionRecord::new("t5", day(20), "Sunbelt Rentals", -300.0, "Checking"),
            TransactionRecord::new("t5", day(20), "dupe in batch", -300.0, "Checking"),
        ]);
        assert_eq!(added, 1);
        assert_eq!(l.len(), 5);
        assert_eq!(l.get("t1").unwrap().name, "Home Depot #4532");
    }

    #[test]
    fn test_uncategorized_newest_first_and_limited() {
        let l = sample();
        let ids: Vec<_> = l.uncategorized(3).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["t2", "t3", "t1"]);
        assert_eq!(l.uncategorized(10).len(), 4);
    }

    #[test]
    fn test_apply_prediction_removes_from_pending() {
        let mut l = sample();
        let p = CategoryPrediction::new(Category::Fuel, "Vehicle Fuel", 0.85, "gas");
        l.apply_prediction("t3", &p).unwrap();

        let t3 = l.get("t3").unwrap();
        assert_eq!(t3.category, Some(Category::Fuel));
        assert_eq!(t3.subcategory.as_deref(), Some("Vehicle Fuel"));
        assert!(t3.ai_categorized);
        assert_eq!(l.uncategorized_count(), 3);
        assert!(l.uncategorized(10).iter().all(|t| t.id != "t3"));
    }

    #[test]
    fn test_apply_prediction_unknown_id() {
        let mut l = sample();
        let p = CategoryPrediction::new(Category::Other, "Uncategorized", 0.1, "");
        assert!(l.apply_prediction("nope", &p).is_err());
    }

    #[test]
    fn test_manual_category_is_not_ai_flagged() {
        let mut l = sample();
        l.set_category("t4", Category::Office, Some("Software".to_string())).unwrap();
        let t4 = l.get("t4").unwrap();
        assert_eq!(t4.category, Some(Category::Office));
        assert!(!t4.ai_categorized);
        assert!(!t4.needs_category());
    }

    #[test]
    fn test_spend_by_category_skips_income() {
        let mut l = sample();
        l.set_category("t1", Category::Materials, None).unwrap();
        l.set_category("t2", Category::Income, None).unwrap();

        let spend = l.spend_by_category();
        assert_eq!(spend.len(), 2);
        assert_eq!(spend[0].category, Some(Category::Materials));
        assert!((spend[0].total - 1249.99).abs() < 1e-9);
        assert_eq!(spend[1].category, None);
        assert_eq!(spend[1].count, 2);
        assert!((spend[1].total - 112.10).abs() < 1e-9);
    }

    #[test]
    fn test_to_input_uses_iso_date() {
        let l = sample();
        let input = l.get("t1").unwrap().to_input();
        assert_eq!(input.date, "2024-01-03");
        assert_eq!(input.amount, -1249.99);
    }

    #[test]
    fn test_store_pending_matches_uncategorized() {
        let mut l = sample();
        let pending = l.pending(2);
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].0, "t2");
        assert_eq!(pending[0].1.name, "Client Payment - Johnson");

        let p = CategoryPrediction::new(Category::Income, "Client Payment", 0.7, "");
        l.record_prediction("t2", &p).unwrap();
        assert_eq!(l.pending(2)[0].0, "t3");
    }

    fn with_projects() -> Ledger {
        let mut l = sample();
        l.add_project(Project::new("kitchen", "Kitchen Remodel", 1300.0)).unwrap();
        l.add_project(Project::new("deck", "Deck Installation", 12000.0)).unwrap();
        l.add_project(Project::new("bath", "Bathroom Addition", 60.0)).unwrap();
        l
    }

    #[test]
    fn test_add_project_validation() {
        let mut l = with_projects();
        assert!(l.add_project(Project::new("deck", "Other Deck", 5.0)).is_err());
        assert!(l.add_project(Project::new("", "No Id", 5.0)).is_err());
        assert!(l.add_project(Project::new("free", "Free", 0.0)).is_err());
        assert!(l.add_project(Project::new("neg", "Negative", -10.0)).is_err());
        assert!(l.add_project(Project::new("nan", "NaN", f64::NAN)).is_err());
        assert_eq!(l.projects.len(), 3);
    }

    #[test]
    fn test_assign_project_checks_both_ids() {
        let mut l = with_projects();
        assert!(l.assign_project("t1", Some("garage")).is_err());
        assert!(l.assign_project("nope", Some("kitchen")).is_err());
        assert_eq!(l.get("t1").unwrap().project, None);

        l.assign_project("t1", Some("kitchen")).unwrap();
        assert_eq!(l.get("t1").unwrap().project.as_deref(), Some("kitchen"));
        l.assign_project("t1", None).unwrap();
        assert_eq!(l.get("t1").unwrap().project, None);
    }

    #[test]
    fn test_project_report_budget_status() {
        let mut l = with_projects();
        // 1249.99 of 1300 => ~96%, near budget
        l.assign_project("t1", Some("kitchen")).unwrap();
        // income never counts as spend
        l.assign_project("t2", Some("kitchen")).unwrap();
        // 62.10 + 50.00 of 60 => over budget
        l.assign_project("t3", Some("bath")).unwrap();
        l.assign_project("t4", Some("bath")).unwrap();

        let report = l.project_report();
        let ids: Vec<_> = report.iter().map(|r| r.project_id.as_str()).collect();
        assert_eq!(ids, ["kitchen", "deck", "bath"]);

        let kitchen = &report[0];
        assert_eq!(kitchen.count, 1);
        assert!((kitchen.spent - 1249.99).abs() < 1e-9);
        assert!((kitchen.remaining - 50.01).abs() < 1e-9);
        assert_eq!(kitchen.status, BudgetStatus::NearBudget);

        let deck = &report[1];
        assert_eq!(deck.spent, 0.0);
        assert_eq!(deck.utilization, 0.0);
        assert_eq!(deck.status, BudgetStatus::OnTrack);

        let bath = &report[2];
        assert_eq!(bath.count, 2);
        assert_eq!(bath.status, BudgetStatus::OverBudget);
        assert!((bath.over_by() - 52.10).abs() < 1e-9);
    }

    #[test]
    fn test_prediction_keeps_suggested_project() {
        let mut l = sample();
        let mut p = CategoryPrediction::new(Category::Materials, "Lumber", 0.9, "deck boards");
        p.suggested_project = Some("Deck".to_string());
        l.apply_prediction("t1", &p).unwrap();
        let t1 = l.get("t1").unwrap();
        assert_eq!(t1.suggested_project.as_deref(), Some("Deck"));
        assert_eq!(t1.project, None);
    }

    #[test]
    fn test_ledger_without_projects_section_loads() {
        let l: Ledger = serde_json::from_str(
            r#"{"transactions":[{"id":"a","date":"2024-01-02","name":"x","amount":-1.0}]}"#,
        )
        .unwrap();
        assert!(l.projects.is_empty());
        assert_eq!(l.get("a").unwrap().project, None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");

        assert!(Ledger::load(&path).unwrap().is_empty());

        let mut l = sample();
        l.set_category("t1", Category::Materials, Some("Lumber".to_string())).unwrap();
        l.add_project(Project::new("kitchen", "Kitchen Remodel", 25000.0).with_client("Johnson Family"))
            .unwrap();
        l.assign_project("t1", Some("kitchen")).unwrap();
        l.save(&path).unwrap();

        let back = Ledger::load(&path).unwrap();
        assert_eq!(back, l);
    }
}
