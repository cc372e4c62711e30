#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An in-memory TaskHub service with failure injection
/// - A marketplace wired to the in-memory service and mock providers
/// - User sign-up and task draft helpers

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use taskhub_client::api::{
    CreateTaskRequest, PaymentIntent, PaymentIntentRequest, SubmissionFilter, SubmissionRecord,
    TaskHubApi, TaskRecord,
};
use taskhub_client::config::LedgerConfig;
use taskhub_client::error::{ClientError, ClientResult};
use taskhub_client::marketplace::Marketplace;
use taskhub_client::providers::{
    Credentials, MockIdentityProvider, MockPaymentProvider, SignUp,
};
use taskhub_shared::models::{
    Decision, NewUser, PaymentRecord, Role, Submission, TaskDraft, User,
};
use taskhub_shared::Coins;

/// Service operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateUser,
    FetchUser,
    PatchBalance,
    CreateTask,
    DeleteTask,
    CreateSubmission,
    PatchSubmission,
    PaymentIntent,
    Checkout,
}

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    tasks: Vec<TaskRecord>,
    submissions: Vec<SubmissionRecord>,
    payments: Vec<PaymentRecord>,
    session: Option<String>,
    next_id: u64,
    /// Remaining injected failures per operation
    failures: HashMap<Op, usize>,
    /// Every mutating call, in order
    writes: Vec<Op>,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn check(&mut self, op: Op) -> ClientResult<()> {
        if let Some(remaining) = self.failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ClientError::Remote {
                    status: 500,
                    message: format!("injected failure: {:?}", op),
                });
            }
        }
        Ok(())
    }

    fn write(&mut self, op: Op) -> ClientResult<()> {
        self.check(op)?;
        self.writes.push(op);
        Ok(())
    }
}

/// In-memory stand-in for the TaskHub service
#[derive(Default)]
pub struct InMemoryApi {
    state: Mutex<State>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` calls of `op` fail with a 500
    pub fn fail(&self, op: Op, times: usize) {
        self.state.lock().unwrap().failures.insert(op, times);
    }

    pub fn balance_of(&self, email: &str) -> Coins {
        self.state.lock().unwrap().users[email].balance
    }

    pub fn set_balance(&self, email: &str, balance: Coins) {
        if let Some(user) = self.state.lock().unwrap().users.get_mut(email) {
            user.balance = balance;
        }
    }

    pub fn task_count(&self) -> usize {
        self.state.lock().unwrap().tasks.len()
    }

    pub fn submission(&self, id: &str) -> Option<Submission> {
        self.state
            .lock()
            .unwrap()
            .submissions
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.submission.clone())
    }

    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.state.lock().unwrap().payments.clone()
    }

    pub fn session_email(&self) -> Option<String> {
        self.state.lock().unwrap().session.clone()
    }

    /// Mutating calls received so far
    pub fn writes(&self) -> Vec<Op> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }
}

#[async_trait]
impl TaskHubApi for InMemoryApi {
    async fn open_session(&self, email: &str) -> ClientResult<()> {
        self.state.lock().unwrap().session = Some(email.to_string());
        Ok(())
    }

    async fn close_session(&self) -> ClientResult<()> {
        self.state.lock().unwrap().session = None;
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> ClientResult<String> {
        let mut state = self.state.lock().unwrap();
        state.write(Op::CreateUser)?;
        let id = state.id("u");
        state.users.insert(
            user.email.clone(),
            User {
                id: Some(id.clone()),
                email: user.email.clone(),
                name: user.name.clone(),
                photo_url: user.photo_url.clone(),
                role: user.role,
                balance: user.balance,
            },
        );
        Ok(id)
    }

    async fn fetch_user(&self, email: &str) -> ClientResult<User> {
        let mut state = self.state.lock().unwrap();
        state.check(Op::FetchUser)?;
        state
            .users
            .get(email)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("user {}", email)))
    }

    async fn list_users(&self) -> ClientResult<Vec<User>> {
        Ok(self.state.lock().unwrap().users.values().cloned().collect())
    }

    async fn patch_balance(&self, email: &str, balance: Coins) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        state.write(Op::PatchBalance)?;
        let user = state
            .users
            .get_mut(email)
            .ok_or_else(|| ClientError::NotFound(format!("user {}", email)))?;
        user.balance = balance;
        Ok(())
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> ClientResult<String> {
        let mut state = self.state.lock().unwrap();
        state.write(Op::CreateTask)?;
        let id = state.id("t");
        state.tasks.push(TaskRecord {
            id: id.clone(),
            task: request.task.clone(),
            user_id: Some(request.user_id.clone()),
            amount: request.amount,
        });
        Ok(id)
    }

    async fn fetch_task(&self, id: &str) -> ClientResult<TaskRecord> {
        self.state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("task {}", id)))
    }

    async fn list_tasks(&self, creator_email: Option<&str>) -> ClientResult<Vec<TaskRecord>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .filter(|t| creator_email.map_or(true, |e| t.task.buyer_email() == e))
            .cloned()
            .collect())
    }

    async fn delete_task(&self, id: &str) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        state.write(Op::DeleteTask)?;
        state.tasks.retain(|t| t.id != id);
        Ok(())
    }

    async fn create_submission(&self, submission: &Submission) -> ClientResult<String> {
        let mut state = self.state.lock().unwrap();
        state.write(Op::CreateSubmission)?;
        let id = state.id("s");
        state.submissions.push(SubmissionRecord {
            id: id.clone(),
            submission: submission.clone(),
        });
        Ok(id)
    }

    async fn list_submissions(
        &self,
        filter: &SubmissionFilter,
    ) -> ClientResult<Vec<SubmissionRecord>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .submissions
            .iter()
            .filter(|r| filter.matches(&r.submission))
            .cloned()
            .collect())
    }

    async fn patch_submission_status(&self, id: &str, decision: Decision) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        state.write(Op::PatchSubmission)?;
        let record = state
            .submissions
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("submission {}", id)))?;
        record.submission.status = decision.target_status();
        Ok(())
    }

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> ClientResult<PaymentIntent> {
        let mut state = self.state.lock().unwrap();
        state.write(Op::PaymentIntent)?;
        let id = state.id("pi_");
        Ok(PaymentIntent {
            client_secret: Some(format!("{}_secret_{}", id, request.price.cents())),
            id: Some(id),
        })
    }

    async fn record_checkout(&self, record: &PaymentRecord) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        state.write(Op::Checkout)?;
        state.payments.push(record.clone());
        Ok(())
    }

    async fn payment_history(&self, email: &str) -> ClientResult<Vec<PaymentRecord>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .payments
            .iter()
            .filter(|p| p.email == email)
            .cloned()
            .collect())
    }
}

/// Test context containing the marketplace and its collaborators
pub struct TestContext {
    pub api: Arc<InMemoryApi>,
    pub payments: Arc<MockPaymentProvider>,
    pub identities: Arc<MockIdentityProvider>,
    pub market: Marketplace,
}

pub const PASSWORD: &str = "correct-horse";
pub const GOOD_CARD: &str = "4242424242424242";
pub const DECLINED_CARD: &str = "4000000000000002";

impl TestContext {
    pub fn new() -> Self {
        let api = Arc::new(InMemoryApi::new());
        let payments = Arc::new(MockPaymentProvider::new());
        let identities = Arc::new(MockIdentityProvider::new());
        let market = Marketplace::new(
            api.clone(),
            payments.clone(),
            identities.clone(),
            LedgerConfig::default(),
        );

        Self {
            api,
            payments,
            identities,
            market,
        }
    }

    /// Signs up and leaves `email` signed in
    pub async fn sign_up(&self, email: &str, role: Role) -> User {
        let form = SignUp {
            credentials: Credentials {
                email: email.to_string(),
                password: PASSWORD.to_string(),
            },
            display_name: email.split('@').next().unwrap_or(email).to_string(),
            photo_url: None,
        };
        self.market.sign_up(&form, role).await.unwrap()
    }

    /// Switches the signed-in user
    pub async fn switch_to(&self, email: &str) -> User {
        self.market.sign_out().await.unwrap();
        self.market
            .sign_in(&Credentials {
                email: email.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap()
    }
}

/// Valid draft due in a week
pub fn draft(pay: i64, workers: u32) -> TaskDraft {
    TaskDraft {
        task_title: "Label 100 images".to_string(),
        task_detail: "Draw a box around every cat".to_string(),
        required_workers: workers,
        payable_amount: Coins::whole(pay),
        completion_date: Utc::now() + Duration::days(7),
        submission_info: "Link to the labelled set".to_string(),
        task_image_url: None,
    }
}
