/// Marketplace flows
///
/// Each flow gates locally with the ledger model, then talks to the TaskHub
/// service and the providers. Local rejections send nothing. Remote failures
/// roll the balance cache back, and compound writes that half-apply are
/// compensated where possible.
///
/// # Flows
///
/// | Flow                  | Role   | Remote steps                                   |
/// |-----------------------|--------|------------------------------------------------|
/// | `create_task`         | Buyer  | read user, insert task, patch balance          |
/// | `submit_work`         | Worker | read task, insert submission                   |
/// | `review_submission`   | Buyer  | read submission, credit worker, patch status   |
/// | `purchase_coins`      | Buyer  | tokenize, intent, confirm, checkout, credit    |
/// | `withdraw`            | Worker | read user, tokenize, intent, confirm, debit    |
///
/// Balance writes are read-modify-write against a service with no
/// conditional update, so two sessions acting on the same account can lose
/// an update. Every flow re-reads the balance right before gating to keep
/// that window short. Nothing is retried automatically.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_client::api::HttpTaskHubApi;
/// use taskhub_client::config::ClientConfig;
/// use taskhub_client::marketplace::Marketplace;
/// use taskhub_client::providers::{Credentials, MockIdentityProvider, MockPaymentProvider};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = ClientConfig::from_env()?;
/// let market = Marketplace::new(
///     Arc::new(HttpTaskHubApi::new(config.api.clone())?),
///     Arc::new(MockPaymentProvider::new()),
///     Arc::new(MockIdentityProvider::new()),
///     config.ledger,
/// );
///
/// market
///     .sign_in(&Credentials {
///         email: "bea@example.com".to_string(),
///         password: "secret123".to_string(),
///     })
///     .await?;
/// println!("Balance: {}", market.balance().await?);
/// # Ok(())
/// # }
/// ```

use crate::api::{
    CreateTaskRequest, PaymentIntentRequest, SubmissionFilter, SubmissionRecord, TaskHubApi,
    TaskRecord,
};
use crate::config::LedgerConfig;
use crate::dashboard::{self, WorkerStats};
use crate::error::{ClientError, ClientResult};
use crate::providers::{
    CardDetails, Credentials, Identity, IdentityProvider, PaymentProvider, SignUp,
};
use crate::session::Session;
use chrono::Utc;
use std::sync::Arc;
use taskhub_shared::ledger::{self, Resolution};
use taskhub_shared::models::{
    CoinPackage, Creator, Decision, NewUser, PaymentRecord, Role, Submission, SubmissionStatus,
    Task, TaskDraft, User, WithdrawalQuote, WorkerRef,
};
use taskhub_shared::{Coins, LedgerError};

/// Entry point for every user-facing action
pub struct Marketplace {
    api: Arc<dyn TaskHubApi>,
    payments: Arc<dyn PaymentProvider>,
    identities: Arc<dyn IdentityProvider>,
    session: Arc<Session>,
    ledger: LedgerConfig,
}

impl Marketplace {
    /// Wires the flows together and starts following sign-in state.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        api: Arc<dyn TaskHubApi>,
        payments: Arc<dyn PaymentProvider>,
        identities: Arc<dyn IdentityProvider>,
        ledger: LedgerConfig,
    ) -> Self {
        let session = Session::start(api.clone(), identities.as_ref());
        Self {
            api,
            payments,
            identities,
            session,
            ledger,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn ledger_config(&self) -> &LedgerConfig {
        &self.ledger
    }

    // ---- accounts ----

    /// Creates the user record for `identity` with the role's starting
    /// balance. An existing record is returned unchanged.
    pub async fn register(&self, identity: &Identity, role: Role) -> ClientResult<User> {
        match self.api.fetch_user(&identity.email).await {
            Ok(existing) => {
                tracing::debug!(email = %identity.email, "User already registered");
                return Ok(existing);
            }
            Err(ClientError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let new_user = NewUser::register(
            identity.email.clone(),
            identity.display_name.clone(),
            identity.photo_url.clone(),
            role,
        );
        let id = self.api.create_user(&new_user).await?;

        tracing::info!(
            email = %new_user.email,
            role = %role,
            balance = %new_user.balance,
            "User registered"
        );

        Ok(User {
            id: Some(id),
            email: new_user.email,
            name: new_user.name,
            photo_url: new_user.photo_url,
            role: new_user.role,
            balance: new_user.balance,
        })
    }

    /// Creates a provider account, signs it in and registers the user
    pub async fn sign_up(&self, form: &SignUp, role: Role) -> ClientResult<User> {
        let identity = self.identities.create_account(form).await?;
        self.session.sync().await?;
        self.register(&identity, role).await
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> ClientResult<User> {
        self.identities.sign_in(credentials).await?;
        self.session.sync().await?;
        self.current_user().await
    }

    /// Third-party sign-in; first-time users are registered as Workers
    pub async fn sign_in_federated(&self, provider: &str) -> ClientResult<User> {
        let identity = self.identities.sign_in_federated(provider).await?;
        self.session.sync().await?;
        self.register(&identity, Role::Worker).await
    }

    pub async fn sign_out(&self) -> ClientResult<()> {
        self.identities.sign_out().await?;
        self.session.sync().await
    }

    /// Tears the session down: stops following the identity provider,
    /// closes the server session and clears the balance cache
    pub async fn shutdown(&self) -> ClientResult<()> {
        self.session.end().await
    }

    /// Signed-in user, freshly read
    pub async fn current_user(&self) -> ClientResult<User> {
        self.session.require_user(|_| true, "").await
    }

    /// Balance shown for the signed-in user
    pub async fn balance(&self) -> ClientResult<Coins> {
        let identity = self.session.require_identity().await?;
        self.session
            .cache()
            .read_through(self.api.as_ref(), &identity.email)
            .await
    }

    // ---- tasks ----

    /// Funds and publishes a task.
    ///
    /// The task is inserted before the balance is debited. If the debit
    /// fails the task is deleted again; if that also fails the error is a
    /// `PartialFailure` naming both causes.
    pub async fn create_task(&self, draft: TaskDraft) -> ClientResult<TaskRecord> {
        let identity = self.session.require_identity().await?;
        let user = self
            .session
            .require_user(|r| r.can_create_tasks(), "only buyers can create tasks")
            .await?;
        let now = Utc::now();

        let funding = ledger::plan_task_creation(&draft, user.balance, now).map_err(|e| {
            tracing::warn!(email = %user.email, code = e.code(), error = %e, "Task creation rejected");
            e
        })?;

        let task = Task::from_draft(
            draft,
            Creator {
                uid: identity.uid.clone(),
                display_name: identity.display_name.clone(),
                email: user.email.clone(),
                photo_url: identity.photo_url.clone().unwrap_or_default(),
            },
            now,
        );
        let request = CreateTaskRequest {
            task,
            user_id: user.id.clone().unwrap_or_else(|| identity.uid.clone()),
            amount: funding.total_cost,
        };

        let cache = self.session.cache();
        cache.apply_optimistic(&user.email, funding.new_balance).await;

        let task_id = match self.api.create_task(&request).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(email = %user.email, error = %e, "Task insert failed");
                cache.rollback(&user.email).await;
                return Err(e);
            }
        };

        if let Err(cause) = self.api.patch_balance(&user.email, funding.new_balance).await {
            tracing::error!(
                email = %user.email,
                task_id = %task_id,
                error = %cause,
                "Balance debit failed after task insert; deleting task"
            );
            cache.rollback(&user.email).await;

            return match self.api.delete_task(&task_id).await {
                Ok(()) => Err(cause),
                Err(compensation) => {
                    tracing::error!(
                        task_id = %task_id,
                        error = %compensation,
                        "Task compensation failed"
                    );
                    Err(ClientError::PartialFailure {
                        step: "balance debit".to_string(),
                        cause: cause.to_string(),
                        compensation: compensation.to_string(),
                    })
                }
            };
        }

        cache.confirm(&user.email, funding.new_balance).await;
        tracing::info!(
            email = %user.email,
            task_id = %task_id,
            total_cost = %funding.total_cost,
            balance = %funding.new_balance,
            "Task created"
        );

        Ok(TaskRecord {
            id: task_id,
            task: request.task,
            user_id: Some(request.user_id),
            amount: request.amount,
        })
    }

    /// Deletes a task owned by the signed-in user (admins may delete any).
    ///
    /// The escrow is not refunded.
    pub async fn delete_task(&self, task_id: &str) -> ClientResult<()> {
        let user = self.current_user().await?;
        let record = self.api.fetch_task(task_id).await?;

        if record.task.buyer_email() != user.email && user.role != Role::Admin {
            tracing::warn!(email = %user.email, task_id = %task_id, "Delete of foreign task refused");
            return Err(ClientError::Forbidden(
                "you can only delete your own tasks".to_string(),
            ));
        }

        self.api.delete_task(task_id).await?;
        tracing::info!(
            email = %user.email,
            task_id = %task_id,
            escrow = %record.amount,
            "Task deleted without refund"
        );
        Ok(())
    }

    pub async fn task(&self, task_id: &str) -> ClientResult<TaskRecord> {
        self.api.fetch_task(task_id).await
    }

    /// Tasks created by the signed-in user
    pub async fn my_tasks(&self) -> ClientResult<Vec<TaskRecord>> {
        let identity = self.session.require_identity().await?;
        self.api.list_tasks(Some(&identity.email)).await
    }

    /// Tasks still accepting submissions
    pub async fn available_tasks(&self) -> ClientResult<Vec<TaskRecord>> {
        let now = Utc::now();
        let tasks = self.api.list_tasks(None).await?;
        Ok(tasks
            .into_iter()
            .filter(|r| r.task.is_open(now) && r.task.draft.required_workers > 0)
            .collect())
    }

    // ---- submissions ----

    /// Submits proof of work against an active task
    pub async fn submit_work(
        &self,
        task_id: &str,
        details: &str,
    ) -> ClientResult<SubmissionRecord> {
        let user = self
            .session
            .require_user(|r| r.can_submit_work(), "only workers can submit work")
            .await?;

        if details.trim().is_empty() {
            return Err(LedgerError::validation("submission_details", "is required").into());
        }

        let record = self.api.fetch_task(task_id).await?;
        let now = Utc::now();
        if !record.task.is_open(now) {
            tracing::warn!(task_id = %task_id, status = %record.task.status, "Task closed for submissions");
            return Err(LedgerError::validation("task", "is not accepting submissions").into());
        }

        let worker = WorkerRef {
            email: user.email.clone(),
            name: user.name.clone(),
        };
        let submission = Submission::pending(task_id, &record.task, &worker, details, now);
        let id = self.api.create_submission(&submission).await?;

        tracing::info!(
            worker = %user.email,
            task_id = %task_id,
            submission_id = %id,
            "Work submitted"
        );
        Ok(SubmissionRecord { id, submission })
    }

    /// Approves or rejects a pending submission on one of the buyer's tasks.
    ///
    /// On approval the worker is credited before the status is patched. If
    /// the status patch fails the credit is reversed.
    pub async fn review_submission(
        &self,
        submission_id: &str,
        decision: Decision,
    ) -> ClientResult<Resolution> {
        let user = self
            .session
            .require_user(|r| r.can_review_submissions(), "only buyers can review submissions")
            .await?;

        let filter = SubmissionFilter::by_buyer(user.email.clone());
        let record = self
            .api
            .list_submissions(&filter)
            .await?
            .into_iter()
            .find(|r| r.id == submission_id)
            .ok_or_else(|| ClientError::NotFound(format!("submission {}", submission_id)))?;

        if !filter.matches(&record.submission) {
            return Err(ClientError::Forbidden(
                "you can only review submissions on your own tasks".to_string(),
            ));
        }

        let submission = &record.submission;
        let resolution = ledger::resolve_submission(
            submission.status,
            decision,
            submission.payable_amount,
        )
        .map_err(|e| {
            tracing::warn!(submission_id = %submission_id, error = %e, "Review rejected");
            e
        })?;

        let Some(credit) = resolution.worker_credit else {
            self.api
                .patch_submission_status(submission_id, decision)
                .await?;
            tracing::info!(submission_id = %submission_id, status = %resolution.status, "Submission resolved");
            return Ok(resolution);
        };

        let worker_email = submission.worker_email.as_str();
        let worker = self.api.fetch_user(worker_email).await?;
        let credited = ledger::apply_approval_credit(worker.balance, credit);
        self.api.patch_balance(worker_email, credited).await?;
        self.session.cache().invalidate(worker_email).await;

        if let Err(cause) = self
            .api
            .patch_submission_status(submission_id, decision)
            .await
        {
            tracing::error!(
                submission_id = %submission_id,
                error = %cause,
                "Status update failed after worker credit; reversing credit"
            );
            return match self.api.patch_balance(worker_email, worker.balance).await {
                Ok(()) => Err(cause),
                Err(compensation) => Err(ClientError::PartialFailure {
                    step: "submission status update".to_string(),
                    cause: cause.to_string(),
                    compensation: compensation.to_string(),
                }),
            };
        }

        tracing::info!(
            submission_id = %submission_id,
            worker = %worker_email,
            credit = %credit,
            "Submission approved"
        );
        Ok(resolution)
    }

    /// Pending submissions on the signed-in buyer's tasks
    pub async fn pending_reviews(&self) -> ClientResult<Vec<SubmissionRecord>> {
        let identity = self.session.require_identity().await?;
        let filter = SubmissionFilter::by_buyer(identity.email)
            .with_status(SubmissionStatus::Pending);
        self.filtered_submissions(&filter).await
    }

    /// Submissions made by the signed-in worker
    pub async fn my_submissions(&self) -> ClientResult<Vec<SubmissionRecord>> {
        let identity = self.session.require_identity().await?;
        self.filtered_submissions(&SubmissionFilter::by_worker(identity.email))
            .await
    }

    pub async fn worker_stats(&self) -> ClientResult<WorkerStats> {
        Ok(WorkerStats::from_submissions(&self.my_submissions().await?))
    }

    async fn filtered_submissions(
        &self,
        filter: &SubmissionFilter,
    ) -> ClientResult<Vec<SubmissionRecord>> {
        // The service may ignore some filters, so they are reapplied here
        Ok(self
            .api
            .list_submissions(filter)
            .await?
            .into_iter()
            .filter(|r| filter.matches(&r.submission))
            .collect())
    }

    // ---- payments ----

    /// Buys a coin package. Coins are credited only after the charge is
    /// confirmed and recorded.
    pub async fn purchase_coins(
        &self,
        package: &CoinPackage,
        card: &CardDetails,
    ) -> ClientResult<PaymentRecord> {
        let user = self
            .session
            .require_user(|r| r.can_purchase_coins(), "only buyers can purchase coins")
            .await?;
        let user_id = user.id.clone().unwrap_or_default();

        let method = self.payments.tokenize(card).await?;
        let intent = self
            .api
            .create_payment_intent(&PaymentIntentRequest {
                payment_method_id: Some(method.id.clone()),
                price: package.price,
                coins: Some(package.coins),
                currency: self.ledger.currency.clone(),
                email: user.email.clone(),
                user_id: user_id.clone(),
            })
            .await?;

        let confirmation = self
            .payments
            .confirm(&method, &intent, package.price)
            .await
            .map_err(|e| {
                tracing::warn!(
                    email = %user.email,
                    provider = self.payments.name(),
                    error = %e,
                    "Payment not confirmed"
                );
                e
            })?;

        let record = PaymentRecord {
            id: Some(confirmation.id.clone()),
            price: package.price,
            coins: Some(package.coins),
            currency: self.ledger.currency.clone(),
            email: user.email.clone(),
            user_id,
            payment_method_id: Some(method.id),
            created_at: Utc::now(),
        };
        let unreversible = |step: &str, cause: ClientError| ClientError::PartialFailure {
            step: step.to_string(),
            cause: cause.to_string(),
            compensation: format!("charge {} cannot be reversed from the client", confirmation.id),
        };

        if let Err(cause) = self.api.record_checkout(&record).await {
            tracing::error!(
                email = %user.email,
                payment_id = %confirmation.id,
                error = %cause,
                "Confirmed charge could not be recorded; no coins credited"
            );
            return Err(unreversible("checkout record", cause));
        }

        let cache = self.session.cache();
        let credit = async {
            let balance = cache.refresh(self.api.as_ref(), &user.email).await?;
            let credited = ledger::apply_purchase_credit(balance, package.coins);
            cache.apply_optimistic(&user.email, credited).await;
            self.api.patch_balance(&user.email, credited).await?;
            Ok::<Coins, ClientError>(credited)
        }
        .await;

        let credited = match credit {
            Ok(credited) => credited,
            Err(cause) => {
                cache.rollback(&user.email).await;
                tracing::error!(
                    email = %user.email,
                    payment_id = %confirmation.id,
                    error = %cause,
                    "Coin credit failed after confirmed charge"
                );
                return Err(unreversible("coin credit", cause));
            }
        };

        cache.confirm(&user.email, credited).await;
        tracing::info!(
            email = %user.email,
            package = %package.label,
            coins = %package.coins,
            price = %package.price,
            "Coins purchased"
        );
        Ok(record)
    }

    /// Dollar amount for `coins` at the configured rate
    pub fn quote_withdrawal(&self, coins: Coins) -> WithdrawalQuote {
        WithdrawalQuote {
            coin_to_withdraw: coins,
            withdraw_amount: ledger::compute_withdrawal_amount(coins, self.ledger.coins_per_dollar),
        }
    }

    /// Cashes out coins. The balance is debited only after the payout is
    /// confirmed.
    pub async fn withdraw(&self, coins: Coins, card: &CardDetails) -> ClientResult<WithdrawalQuote> {
        let user = self
            .session
            .require_user(|r| r.can_withdraw(), "only workers can withdraw")
            .await?;

        ledger::validate_withdrawal(user.balance, coins, self.ledger.min_withdrawal).map_err(|e| {
            tracing::warn!(email = %user.email, code = e.code(), error = %e, "Withdrawal rejected");
            e
        })?;
        let quote = self.quote_withdrawal(coins);

        let method = self.payments.tokenize(card).await?;
        let intent = self
            .api
            .create_payment_intent(&PaymentIntentRequest {
                payment_method_id: Some(method.id.clone()),
                price: quote.withdraw_amount,
                coins: Some(coins),
                currency: self.ledger.currency.clone(),
                email: user.email.clone(),
                user_id: user.id.clone().unwrap_or_default(),
            })
            .await?;

        let confirmation = self
            .payments
            .confirm(&method, &intent, quote.withdraw_amount)
            .await
            .map_err(|e| {
                tracing::warn!(
                    email = %user.email,
                    provider = self.payments.name(),
                    error = %e,
                    "Payout not confirmed"
                );
                e
            })?;

        let cache = self.session.cache();
        let debit = async {
            let balance = cache.refresh(self.api.as_ref(), &user.email).await?;
            let debited = ledger::apply_withdrawal(balance, coins)?;
            cache.apply_optimistic(&user.email, debited).await;
            self.api.patch_balance(&user.email, debited).await?;
            Ok::<Coins, ClientError>(debited)
        }
        .await;

        let debited = match debit {
            Ok(debited) => debited,
            Err(cause) => {
                cache.rollback(&user.email).await;
                tracing::error!(
                    email = %user.email,
                    payout_id = %confirmation.id,
                    error = %cause,
                    "Coin debit failed after confirmed payout"
                );
                return Err(ClientError::PartialFailure {
                    step: "coin debit".to_string(),
                    cause: cause.to_string(),
                    compensation: format!(
                        "payout {} cannot be reversed from the client",
                        confirmation.id
                    ),
                });
            }
        };

        cache.confirm(&user.email, debited).await;
        tracing::info!(
            email = %user.email,
            coins = %coins,
            amount = %quote.withdraw_amount,
            "Withdrawal completed"
        );
        Ok(quote)
    }

    pub async fn payment_history(&self) -> ClientResult<Vec<PaymentRecord>> {
        let identity = self.session.require_identity().await?;
        self.api.payment_history(&identity.email).await
    }

    // ---- home page ----

    /// Highest-balance workers
    pub async fn top_workers(&self) -> ClientResult<Vec<User>> {
        Ok(dashboard::top_workers(
            self.api.list_users().await?,
            dashboard::TOP_WORKERS,
        ))
    }
}
