/// Wire shapes for the TaskHub service
///
/// The service stores request bodies largely as sent, so several responses
/// wrap the domain document (`task`, `submissionData`) next to an `_id`.

use serde::{Deserialize, Serialize};
use taskhub_shared::models::{Decision, Submission, SubmissionStatus, Task};
use taskhub_shared::{Coins, Usd};

/// `{ insertedId }` returned by create endpoints
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Inserted {
    #[serde(rename = "insertedId")]
    pub inserted_id: String,
}

/// `PATCH /users?email=` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalancePatch {
    pub balance: Coins,
}

/// `POST /login` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
}

/// `POST /tasks` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTaskRequest {
    pub task: Task,

    #[serde(rename = "userId")]
    pub user_id: String,

    /// Escrowed amount
    pub amount: Coins,
}

/// Stored task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(rename = "_id")]
    pub id: String,

    pub task: Task,

    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub amount: Coins,
}

/// `POST /submissions` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSubmissionRequest<'a> {
    #[serde(rename = "submissionData")]
    pub submission_data: &'a Submission,
}

/// Stored submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "submissionData")]
    pub submission: Submission,
}

/// `GET /submissions` answers with one of three envelopes
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubmissionList {
    Data { data: Vec<SubmissionRecord> },
    Result { result: Vec<SubmissionRecord> },
    Bare(Vec<SubmissionRecord>),
}

impl SubmissionList {
    pub fn into_records(self) -> Vec<SubmissionRecord> {
        match self {
            SubmissionList::Data { data } => data,
            SubmissionList::Result { result } => result,
            SubmissionList::Bare(records) => records,
        }
    }
}

/// Query filter for `GET /submissions`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionFilter {
    pub worker_email: Option<String>,
    pub buyer_email: Option<String>,
    pub status: Option<SubmissionStatus>,
}

impl SubmissionFilter {
    pub fn by_worker(email: impl Into<String>) -> Self {
        Self {
            worker_email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn by_buyer(email: impl Into<String>) -> Self {
        Self {
            buyer_email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: SubmissionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Query pairs using the service's parameter names
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(email) = &self.worker_email {
            pairs.push(("worker_email", email.clone()));
        }
        if let Some(email) = &self.buyer_email {
            pairs.push(("Buyer_email", email.clone()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }

    /// Local equivalent of the server-side filter
    pub fn matches(&self, submission: &Submission) -> bool {
        self.worker_email
            .as_deref()
            .map_or(true, |e| submission.worker_email == e)
            && self
                .buyer_email
                .as_deref()
                .map_or(true, |e| submission.buyer_email == e)
            && self.status.map_or(true, |s| submission.status == s)
    }
}

/// `PATCH /submissions/:id` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusPatch {
    pub status: Decision,
}

/// `POST /create-payment-intent` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentIntentRequest {
    #[serde(rename = "paymentMethodId", skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,

    pub price: Usd,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub coins: Option<Coins>,

    pub currency: String,

    pub email: String,

    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Payment intent created by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    #[serde(rename = "clientSecret", default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub id: Option<String>,
}
