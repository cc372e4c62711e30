/// Submission model
///
/// A submission is a Worker's claim of completed work against a task. It is
/// created `pending` and resolved exactly once by the task's Buyer.
///
/// # State Machine
///
/// ```text
/// pending → approved
///         → rejected
/// ```
///
/// Both resolved states are terminal.

use crate::models::task::Task;
use crate::money::Coins;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Submission review state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Awaiting Buyer review
    #[default]
    Pending,

    /// Accepted; worker is owed the task's pay
    Approved,

    /// Declined
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }

    /// Checks if transition to target state is valid
    pub fn can_transition_to(&self, target: SubmissionStatus) -> bool {
        matches!(
            (self, target),
            (SubmissionStatus::Pending, SubmissionStatus::Approved)
                | (SubmissionStatus::Pending, SubmissionStatus::Rejected)
        )
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buyer's review decision; wire values are `approve` / `reject`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Status this decision resolves to
    pub fn target_status(&self) -> SubmissionStatus {
        match self {
            Decision::Approve => SubmissionStatus::Approved,
            Decision::Reject => SubmissionStatus::Rejected,
        }
    }
}

/// Submission document (the `submissionData` object on the wire)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub task_id: String,

    pub task_title: String,

    /// Copied from the task at submission time
    pub payable_amount: Coins,

    pub worker_email: String,

    #[serde(default)]
    pub worker_name: String,

    #[serde(rename = "Buyer_name", default)]
    pub buyer_name: String,

    #[serde(rename = "Buyer_email")]
    pub buyer_email: String,

    /// Proof of work
    #[serde(default)]
    pub submission_details: String,

    /// Submitted at
    pub current_date: DateTime<Utc>,

    #[serde(default)]
    pub status: SubmissionStatus,
}

/// Worker identity attached to a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRef {
    pub email: String,
    pub name: String,
}

impl Submission {
    /// Builds a pending submission, denormalising task and buyer data
    pub fn pending(
        task_id: impl Into<String>,
        task: &Task,
        worker: &WorkerRef,
        details: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            task_title: task.title().to_string(),
            payable_amount: task.payable_amount(),
            worker_email: worker.email.clone(),
            worker_name: worker.name.clone(),
            buyer_name: task.created_by.display_name.clone(),
            buyer_email: task.buyer_email().to_string(),
            submission_details: details.into(),
            current_date: submitted_at,
            status: SubmissionStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let pending = SubmissionStatus::Pending;
        assert!(pending.can_transition_to(SubmissionStatus::Approved));
        assert!(pending.can_transition_to(SubmissionStatus::Rejected));
        assert!(!pending.can_transition_to(SubmissionStatus::Pending));

        for terminal in [SubmissionStatus::Approved, SubmissionStatus::Rejected] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(SubmissionStatus::Approved));
            assert!(!terminal.can_transition_to(SubmissionStatus::Rejected));
            assert!(!terminal.can_transition_to(SubmissionStatus::Pending));
        }
    }

    #[test]
    fn test_decision_wire_values() {
        assert_eq!(serde_json::to_string(&Decision::Approve).unwrap(), "\"approve\"");
        assert_eq!(serde_json::to_string(&Decision::Reject).unwrap(), "\"reject\"");
        assert_eq!(Decision::Reject.target_status(), SubmissionStatus::Rejected);
    }

    #[test]
    fn test_submission_wire_format() {
        let json = r#"{
            "task_id": "t1",
            "task_title": "Label images",
            "payable_amount": 5,
            "worker_email": "w@example.com",
            "worker_name": "Wanda",
            "Buyer_name": "Bea",
            "Buyer_email": "bea@example.com",
            "submission_details": "done",
            "current_date": "2025-01-04T12:00:00Z",
            "status": "pending"
        }"#;

        let submission: Submission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.status, SubmissionStatus::Pending);
        assert_eq!(submission.payable_amount, Coins::whole(5));
        assert_eq!(submission.buyer_email, "bea@example.com");
    }
}
