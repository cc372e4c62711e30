/// reqwest implementation of [`TaskHubApi`]
///
/// # Example
///
/// ```no_run
/// use taskhub_client::api::{HttpTaskHubApi, TaskHubApi};
/// use taskhub_client::config::ClientConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = ClientConfig::from_env()?;
/// let api = HttpTaskHubApi::new(config.api)?;
///
/// let user = api.fetch_user("bea@example.com").await?;
/// println!("{} has {} coins", user.email, user.balance);
/// # Ok(())
/// # }
/// ```

use super::dto::{
    BalancePatch, CreateSubmissionRequest, CreateTaskRequest, Inserted, LoginRequest,
    PaymentIntent, PaymentIntentRequest, StatusPatch, SubmissionFilter, SubmissionList,
    SubmissionRecord, TaskRecord,
};
use super::TaskHubApi;
use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use taskhub_shared::models::{Decision, NewUser, PaymentRecord, Submission, User};
use taskhub_shared::Coins;

/// Error body sent by the service
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for the TaskHub service
#[derive(Clone)]
pub struct HttpTaskHubApi {
    client: Client,
    config: ApiConfig,
}

impl HttpTaskHubApi {
    /// Builds a client with the configured timeout and a cookie store for
    /// the server session
    pub fn new(config: ApiConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.config.url(path));
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and maps non-2xx statuses to `ClientError::Remote`
    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "request to TaskHub service failed");
            ClientError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| {
                if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    body
                }
            });

        tracing::warn!(status = status.as_u16(), %message, "TaskHub service returned an error");
        Err(ClientError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> ClientResult<()> {
        self.send(builder).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskHubApi for HttpTaskHubApi {
    async fn open_session(&self, email: &str) -> ClientResult<()> {
        tracing::debug!(%email, "opening server session");
        self.send_empty(self.request(Method::POST, "/login").json(&LoginRequest { email }))
            .await
    }

    async fn close_session(&self) -> ClientResult<()> {
        tracing::debug!("closing server session");
        self.send_empty(
            self.request(Method::POST, "/logout")
                .json(&serde_json::json!({})),
        )
        .await
    }

    async fn create_user(&self, user: &NewUser) -> ClientResult<String> {
        let inserted: Inserted = self
            .send_json(self.request(Method::POST, "/users").json(user))
            .await?;
        Ok(inserted.inserted_id)
    }

    async fn fetch_user(&self, email: &str) -> ClientResult<User> {
        let user: Option<User> = self
            .send_json(self.request(Method::GET, "/users").query(&[("email", email)]))
            .await?;
        user.ok_or_else(|| ClientError::NotFound(format!("user {}", email)))
    }

    async fn list_users(&self) -> ClientResult<Vec<User>> {
        self.send_json(self.request(Method::GET, "/users")).await
    }

    async fn patch_balance(&self, email: &str, balance: Coins) -> ClientResult<()> {
        tracing::debug!(%email, %balance, "patching balance");
        self.send_empty(
            self.request(Method::PATCH, "/users")
                .query(&[("email", email)])
                .json(&BalancePatch { balance }),
        )
        .await
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> ClientResult<String> {
        let inserted: Inserted = self
            .send_json(self.request(Method::POST, "/tasks").json(request))
            .await?;
        Ok(inserted.inserted_id)
    }

    async fn fetch_task(&self, id: &str) -> ClientResult<TaskRecord> {
        let record: Option<TaskRecord> = self
            .send_json(self.request(Method::GET, &format!("/tasks/{}", id)))
            .await?;
        record.ok_or_else(|| ClientError::NotFound(format!("task {}", id)))
    }

    async fn list_tasks(&self, creator_email: Option<&str>) -> ClientResult<Vec<TaskRecord>> {
        let mut builder = self.request(Method::GET, "/tasks");
        if let Some(email) = creator_email {
            builder = builder.query(&[("email", email)]);
        }
        self.send_json(builder).await
    }

    async fn delete_task(&self, id: &str) -> ClientResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/tasks/{}", id)))
            .await
    }

    async fn create_submission(&self, submission: &Submission) -> ClientResult<String> {
        let inserted: Inserted = self
            .send_json(
                self.request(Method::POST, "/submissions")
                    .json(&CreateSubmissionRequest {
                        submission_data: submission,
                    }),
            )
            .await?;
        Ok(inserted.inserted_id)
    }

    async fn list_submissions(
        &self,
        filter: &SubmissionFilter,
    ) -> ClientResult<Vec<SubmissionRecord>> {
        let list: SubmissionList = self
            .send_json(
                self.request(Method::GET, "/submissions")
                    .query(&filter.query_pairs()),
            )
            .await?;
        Ok(list.into_records())
    }

    async fn patch_submission_status(&self, id: &str, decision: Decision) -> ClientResult<()> {
        self.send_empty(
            self.request(Method::PATCH, &format!("/submissions/{}", id))
                .json(&StatusPatch { status: decision }),
        )
        .await
    }

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> ClientResult<PaymentIntent> {
        self.send_json(
            self.request(Method::POST, "/create-payment-intent")
                .json(request),
        )
        .await
    }

    async fn record_checkout(&self, record: &PaymentRecord) -> ClientResult<()> {
        self.send_empty(self.request(Method::POST, "/checkout").json(record))
            .await
    }

    async fn payment_history(&self, email: &str) -> ClientResult<Vec<PaymentRecord>> {
        self.send_json(
            self.request(Method::GET, "/checkout")
                .query(&[("email", email)]),
        )
        .await
    }
}
