//! Construction projects and budget tracking.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Utilization above this percentage is flagged as approaching the budget.
pub const NEAR_BUDGET_PCT: f64 = 90.0;

/// A job the business tracks spend against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Planned spend, in dollars; always positive
    pub budget: f64,
    #[serde(default)]
    pub client: Option<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>, budget: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            budget,
            client: None,
        }
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    OnTrack,
    /// More than 90% of the budget spent
    NearBudget,
    /// More than 100% of the budget spent
    OverBudget,
}

impl BudgetStatus {
    /// Classify a utilization percentage (spent / budget * 100).
    pub fn from_utilization(pct: f64) -> Self {
        if pct > 100.0 {
            BudgetStatus::OverBudget
        } else if pct > NEAR_BUDGET_PCT {
            BudgetStatus::NearBudget
        } else {
            BudgetStatus::OnTrack
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::OnTrack => "on track",
            BudgetStatus::NearBudget => "near budget",
            BudgetStatus::OverBudget => "over budget",
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget position of one project
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSpend {
    pub project_id: String,
    pub name: String,
    pub budget: f64,
    /// Sum of expense amounts assigned to the project
    pub spent: f64,
    /// `budget - spent`; negative once over budget
    pub remaining: f64,
    /// `spent / budget * 100`
    pub utilization: f64,
    pub count: usize,
    pub status: BudgetStatus,
}

impl ProjectSpend {
    pub fn new(project: &Project, spent: f64, count: usize) -> Self {
        let utilization = spent / project.budget * 100.0;
        Self {
            project_id: project.id.clone(),
            name: project.name.clone(),
            budget: project.budget,
            spent,
            remaining: project.budget - spent,
            utilization,
            count,
            status: BudgetStatus::from_utilization(utilization),
        }
    }

    /// How far past the budget spend has gone; zero when within budget.
    pub fn over_by(&self) -> f64 {
        (-self.remaining).max(0.0)
    }
}
