/// Task model
///
/// A task is posted by a Buyer and paid out per approved worker. Funding is
/// escrowed at creation: the Buyer's balance drops by
/// `payable_amount × required_workers` when the task is inserted.
///
/// # Lifecycle
///
/// ```text
/// active → completed
///        → cancelled
/// ```
///
/// # Wire format
///
/// The remote service stores tasks as `{ _id, task: {...}, userId, amount }`;
/// [`Task`] is the inner `task` document.

use crate::ledger;
use crate::money::Coins;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepting submissions
    Active,

    /// All required workers approved
    Completed,

    /// Withdrawn by its creator
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Whether workers may still submit
    pub fn accepts_submissions(&self) -> bool {
        matches!(self, TaskStatus::Active)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task creation form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TaskDraft {
    #[validate(custom(function = "validate_not_blank"))]
    pub task_title: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub task_detail: String,

    /// Number of workers to pay
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub required_workers: u32,

    /// Pay per approved worker
    #[validate(custom(function = "validate_non_negative"))]
    pub payable_amount: Coins,

    /// Deadline; must be in the future at creation
    pub completion_date: DateTime<Utc>,

    /// What workers must hand in
    #[validate(custom(function = "validate_not_blank"))]
    pub submission_info: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_image_url: Option<String>,
}

/// Text fields must hold something other than whitespace
fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("is required".into());
        return Err(err);
    }
    Ok(())
}

fn validate_non_negative(amount: &Coins) -> Result<(), ValidationError> {
    if amount.is_negative() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

impl TaskDraft {
    /// Escrow needed to fund this draft
    pub fn total_cost(&self) -> Coins {
        ledger::compute_task_cost(self.payable_amount, self.required_workers)
    }
}

/// Snapshot of the task creator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub uid: String,

    #[serde(rename = "displayName")]
    pub display_name: String,

    pub email: String,

    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
}

/// Funded task document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(flatten)]
    pub draft: TaskDraft,

    /// Kept for the wire only; read through [`Task::total_cost`]
    #[serde(default)]
    total_cost: Coins,

    pub created_by: Creator,

    pub created_at: DateTime<Utc>,

    pub status: TaskStatus,
}

impl Task {
    /// Builds an active task from a validated draft
    pub fn from_draft(draft: TaskDraft, created_by: Creator, created_at: DateTime<Utc>) -> Self {
        let total_cost = draft.total_cost();
        Self {
            draft,
            total_cost,
            created_by,
            created_at,
            status: TaskStatus::Active,
        }
    }

    /// Total escrow, always recomputed from pay and worker count
    pub fn total_cost(&self) -> Coins {
        self.draft.total_cost()
    }

    pub fn title(&self) -> &str {
        &self.draft.task_title
    }

    pub fn payable_amount(&self) -> Coins {
        self.draft.payable_amount
    }

    pub fn buyer_email(&self) -> &str {
        &self.created_by.email
    }

    /// Open for submissions at `now`
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status.accepts_submissions() && self.draft.completion_date > now
    }
}
