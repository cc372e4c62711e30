/// Dashboard views
///
/// Pure read-side helpers over data already fetched from the service:
/// worker earnings, the buyer's task list (search, status filter, sort and
/// summary) and the top-workers leaderboard.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use taskhub_client::dashboard::{TaskFilter, TaskQuery, TaskSort};
///
/// let query = TaskQuery::default()
///     .search("label")
///     .filter(TaskFilter::Active)
///     .sort(TaskSort::PayableDesc);
/// let visible = query.apply(Vec::new(), Utc::now());
/// assert!(visible.is_empty());
/// ```

use crate::api::{SubmissionRecord, TaskRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;
use taskhub_shared::models::{Role, SubmissionStatus, User};
use taskhub_shared::Coins;

/// Leaderboard size on the home page
pub const TOP_WORKERS: usize = 6;

/// Worker dashboard figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorkerStats {
    pub total_submissions: usize,
    pub pending_submissions: usize,
    pub approved_submissions: usize,

    /// Sum of payable amounts over approved submissions
    pub total_earnings: Coins,
}

impl WorkerStats {
    pub fn from_submissions(records: &[SubmissionRecord]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total_submissions += 1;
            match record.submission.status {
                SubmissionStatus::Pending => stats.pending_submissions += 1,
                SubmissionStatus::Approved => {
                    stats.approved_submissions += 1;
                    stats.total_earnings = stats
                        .total_earnings
                        .saturating_add(record.submission.payable_amount);
                }
                SubmissionStatus::Rejected => {}
            }
            stats
        })
    }
}

/// Deadline-based task filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    /// Deadline still ahead
    Active,
    /// Deadline passed
    Completed,
}

impl TaskFilter {
    fn admits(&self, record: &TaskRecord, now: DateTime<Utc>) -> bool {
        let open = record.task.draft.completion_date > now;
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => open,
            TaskFilter::Completed => !open,
        }
    }
}

/// Task list ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    #[default]
    Newest,
    Oldest,
    PayableAsc,
    PayableDesc,
    /// Earliest deadline first
    Deadline,
}

impl FromStr for TaskSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(TaskSort::Newest),
            "oldest" => Ok(TaskSort::Oldest),
            "payable-asc" => Ok(TaskSort::PayableAsc),
            "payable-desc" => Ok(TaskSort::PayableDesc),
            "deadline" => Ok(TaskSort::Deadline),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

impl TaskSort {
    fn compare(&self, a: &TaskRecord, b: &TaskRecord) -> Ordering {
        match self {
            TaskSort::Newest => b.task.created_at.cmp(&a.task.created_at),
            TaskSort::Oldest => a.task.created_at.cmp(&b.task.created_at),
            TaskSort::PayableAsc => a.task.payable_amount().cmp(&b.task.payable_amount()),
            TaskSort::PayableDesc => b.task.payable_amount().cmp(&a.task.payable_amount()),
            TaskSort::Deadline => a
                .task
                .draft
                .completion_date
                .cmp(&b.task.draft.completion_date),
        }
    }
}

/// Search, filter and sort over a task list
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    search: Option<String>,
    filter: TaskFilter,
    sort: TaskSort,
}

impl TaskQuery {
    /// Case-insensitive match on title or detail
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into().trim().to_lowercase();
        self.search = (!term.is_empty()).then_some(term);
        self
    }

    pub fn filter(mut self, filter: TaskFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, sort: TaskSort) -> Self {
        self.sort = sort;
        self
    }

    fn matches(&self, record: &TaskRecord) -> bool {
        match &self.search {
            Some(term) => {
                record.task.draft.task_title.to_lowercase().contains(term)
                    || record.task.draft.task_detail.to_lowercase().contains(term)
            }
            None => true,
        }
    }

    pub fn apply(&self, records: Vec<TaskRecord>, now: DateTime<Utc>) -> Vec<TaskRecord> {
        let mut visible: Vec<TaskRecord> = records
            .into_iter()
            .filter(|r| self.matches(r) && self.filter.admits(r, now))
            .collect();
        visible.sort_by(|a, b| self.sort.compare(a, b));
        visible
    }
}

/// Buyer task list summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BuyerSummary {
    pub total_tasks: usize,
    pub active_tasks: usize,
    pub total_spend: Coins,
}

impl BuyerSummary {
    pub fn from_tasks(records: &[TaskRecord], now: DateTime<Utc>) -> Self {
        Self {
            total_tasks: records.len(),
            active_tasks: records
                .iter()
                .filter(|r| r.task.draft.completion_date > now)
                .count(),
            total_spend: buyer_spend(records),
        }
    }
}

/// Total escrowed across `records`.
///
/// Uses the stored funding amount, falling back to the recomputed cost for
/// records saved without one.
pub fn buyer_spend(records: &[TaskRecord]) -> Coins {
    records.iter().fold(Coins::ZERO, |sum, record| {
        let funded = if record.amount.is_zero() {
            record.task.total_cost()
        } else {
            record.amount
        };
        sum.saturating_add(funded)
    })
}

/// Workers ranked by balance, highest first
pub fn top_workers(users: Vec<User>, limit: usize) -> Vec<User> {
    let mut workers: Vec<User> = users
        .into_iter()
        .filter(|u| u.role == Role::Worker)
        .collect();
    workers.sort_by(|a, b| b.balance.cmp(&a.balance));
    workers.truncate(limit);
    workers
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use taskhub_shared::models::{Creator, Submission, Task, TaskDraft};

    fn record(id: &str, title: &str, pay: i64, workers: u32, age_days: i64, due_days: i64) -> TaskRecord {
        let now = Utc::now();
        let draft = TaskDraft {
            task_title: title.to_string(),
            task_detail: format!("{} in detail", title),
            required_workers: workers,
            payable_amount: Coins::whole(pay),
            completion_date: now + Duration::days(due_days),
            submission_info: "screenshot".to_string(),
            task_image_url: None,
        };
        let creator = Creator {
            uid: "u1".to_string(),
            display_name: "Bea".to_string(),
            email: "b@example.com".to_string(),
            photo_url: String::new(),
        };
        let task = Task::from_draft(draft, creator, now - Duration::days(age_days));
        TaskRecord {
            id: id.to_string(),
            amount: task.total_cost(),
            task,
            user_id: Some("u1".to_string()),
        }
    }

    fn submission(status: SubmissionStatus, pay: i64) -> SubmissionRecord {
        SubmissionRecord {
            id: "s".to_string(),
            submission: Submission {
                task_id: "t".to_string(),
                task_title: "Label".to_string(),
                payable_amount: Coins::whole(pay),
                worker_email: "w@example.com".to_string(),
                worker_name: "Wanda".to_string(),
                buyer_name: "Bea".to_string(),
                buyer_email: "b@example.com".to_string(),
                submission_details: "done".to_string(),
                current_date: Utc::now(),
                status,
            },
        }
    }

    #[test]
    fn test_worker_stats() {
        let stats = WorkerStats::from_submissions(&[
            submission(SubmissionStatus::Approved, 5),
            submission(SubmissionStatus::Approved, 7),
            submission(SubmissionStatus::Pending, 3),
            submission(SubmissionStatus::Rejected, 9),
        ]);
        assert_eq!(stats.total_submissions, 4);
        assert_eq!(stats.pending_submissions, 1);
        assert_eq!(stats.approved_submissions, 2);
        assert_eq!(stats.total_earnings, Coins::whole(12));
    }

    #[test]
    fn test_query_search_and_sort() {
        let tasks = vec![
            record("a", "Label images", 5, 2, 3, 7),
            record("b", "Write review", 9, 1, 1, 7),
            record("c", "Label audio", 2, 4, 2, -1),
        ];

        let ids = |records: Vec<TaskRecord>| records.into_iter().map(|r| r.id).collect::<Vec<_>>();

        let query = TaskQuery::default().search("LABEL").sort(TaskSort::PayableDesc);
        assert_eq!(ids(query.apply(tasks.clone(), Utc::now())), vec!["a", "c"]);

        let query = TaskQuery::default().filter(TaskFilter::Active);
        assert_eq!(ids(query.apply(tasks.clone(), Utc::now())), vec!["b", "a"]);

        let query = TaskQuery::default().filter(TaskFilter::Completed);
        assert_eq!(ids(query.apply(tasks, Utc::now())), vec!["c"]);
    }

    #[test]
    fn test_buyer_summary() {
        let tasks = vec![record("a", "One", 5, 4, 1, 7), record("b", "Two", 2, 5, 1, -1)];
        let summary = BuyerSummary::from_tasks(&tasks, Utc::now());
        assert_eq!(summary.total_tasks, 2);
        assert_eq!(summary.active_tasks, 1);
        assert_eq!(summary.total_spend, Coins::whole(30));
    }

    #[test]
    fn test_top_workers() {
        let user = |email: &str, role: Role, balance: i64| User {
            id: None,
            email: email.to_string(),
            name: email.to_string(),
            photo_url: None,
            role,
            balance: Coins::whole(balance),
        };
        let users = vec![
            user("w1", Role::Worker, 10),
            user("b1", Role::Buyer, 900),
            user("w2", Role::Worker, 300),
            user("w3", Role::Worker, 40),
        ];

        let top = top_workers(users, 2);
        let emails: Vec<_> = top.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["w2", "w3"]);
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!("deadline".parse::<TaskSort>().unwrap(), TaskSort::Deadline);
        assert!("sideways".parse::<TaskSort>().is_err());
    }
}
