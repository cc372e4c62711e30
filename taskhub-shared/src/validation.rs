/// Task form validation
///
/// Field rules come from the `validator` derive on
/// [`TaskDraft`](crate::models::task::TaskDraft); the deadline is checked
/// here against an explicit `now` so validation stays a pure function.

use crate::error::{LedgerError, LedgerResult};
use crate::models::task::TaskDraft;
use chrono::{DateTime, Utc};
use validator::Validate;

/// Fields in form order; the first failing one is reported
const FIELD_ORDER: [&str; 5] = [
    "task_title",
    "task_detail",
    "required_workers",
    "payable_amount",
    "submission_info",
];

/// Validates a task draft at time `now`.
///
/// Reports the first failing field in form order, then the deadline.
pub fn validate_task_fields(draft: &TaskDraft, now: DateTime<Utc>) -> LedgerResult<()> {
    if let Err(errors) = draft.validate() {
        let field_errors = errors.field_errors();
        for field in FIELD_ORDER {
            if let Some(first) = field_errors.get(field).and_then(|errs| errs.first()) {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| first.code.to_string());
                tracing::debug!(field, %message, "task draft rejected");
                return Err(LedgerError::validation(field, message));
            }
        }
        return Err(LedgerError::validation("task", errors.to_string()));
    }

    if draft.completion_date <= now {
        tracing::debug!(deadline = %draft.completion_date, "task deadline not in the future");
        return Err(LedgerError::validation(
            "completion_date",
            "must be in the future",
        ));
    }

    Ok(())
}
