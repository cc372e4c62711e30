/// Remote TaskHub service
///
/// The service owns all persistent state. This module defines the contract
/// the client depends on ([`TaskHubApi`]) and an HTTP implementation.
///
/// # Endpoints
///
/// ```text
/// POST   /login                    open server session
/// POST   /logout                   close server session
/// GET    /users                    list users
/// POST   /users                    register user
/// GET    /users?email=             fetch user
/// PATCH  /users?email=             { balance }
/// GET    /tasks[?email=]           list tasks
/// GET    /tasks/:id                fetch task
/// POST   /tasks                    { task, userId, amount }
/// DELETE /tasks/:id
/// GET    /submissions?...          list submissions
/// POST   /submissions              { submissionData }
/// PATCH  /submissions/:id          { status: approve|reject }
/// POST   /create-payment-intent    payment intent
/// POST   /checkout                 record purchase
/// GET    /checkout?email=          payment history
/// ```
///
/// Balance writes replace the stored value; the service offers no
/// conditional decrement, so callers re-read before every write.

pub mod dto;
pub mod http;

use crate::error::ClientResult;
use async_trait::async_trait;
use taskhub_shared::models::{Decision, NewUser, PaymentRecord, Submission, User};
use taskhub_shared::Coins;

pub use dto::{
    CreateTaskRequest, PaymentIntent, PaymentIntentRequest, SubmissionFilter, SubmissionRecord,
    TaskRecord,
};
pub use http::HttpTaskHubApi;

/// Operations the client needs from the remote service
#[async_trait]
pub trait TaskHubApi: Send + Sync {
    /// Tells the service who is signed in
    async fn open_session(&self, email: &str) -> ClientResult<()>;

    async fn close_session(&self) -> ClientResult<()>;

    /// Registers a user, returning its id
    async fn create_user(&self, user: &NewUser) -> ClientResult<String>;

    /// Fetches a user by email; `NotFound` when unknown
    async fn fetch_user(&self, email: &str) -> ClientResult<User>;

    async fn list_users(&self) -> ClientResult<Vec<User>>;

    /// Replaces the stored balance
    async fn patch_balance(&self, email: &str, balance: Coins) -> ClientResult<()>;

    /// Inserts a task, returning its id
    async fn create_task(&self, request: &CreateTaskRequest) -> ClientResult<String>;

    async fn fetch_task(&self, id: &str) -> ClientResult<TaskRecord>;

    /// Lists tasks, optionally only those created by `creator_email`
    async fn list_tasks(&self, creator_email: Option<&str>) -> ClientResult<Vec<TaskRecord>>;

    async fn delete_task(&self, id: &str) -> ClientResult<()>;

    /// Inserts a submission, returning its id
    async fn create_submission(&self, submission: &Submission) -> ClientResult<String>;

    async fn list_submissions(&self, filter: &SubmissionFilter)
        -> ClientResult<Vec<SubmissionRecord>>;

    async fn patch_submission_status(&self, id: &str, decision: Decision) -> ClientResult<()>;

    async fn create_payment_intent(&self, request: &PaymentIntentRequest)
        -> ClientResult<PaymentIntent>;

    async fn record_checkout(&self, record: &PaymentRecord) -> ClientResult<()>;

    async fn payment_history(&self, email: &str) -> ClientResult<Vec<PaymentRecord>>;
}
