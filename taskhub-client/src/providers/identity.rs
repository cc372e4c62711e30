/// Identity provider contract
///
/// The provider owns credentials. The client learns who is signed in by
/// subscribing to a `watch` channel that carries `Some(identity)` after a
/// sign-in and `None` after a sign-out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Identity provider errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account already exists for {0}")]
    AccountExists(String),

    #[error("password is too weak: {0}")]
    WeakPassword(String),

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Signed-in principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// Email/password pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .finish()
    }
}

/// Account creation form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub credentials: Credentials,
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// Account and sign-in provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account and signs it in
    async fn create_account(&self, form: &SignUp) -> Result<Identity, IdentityError>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, IdentityError>;

    /// Third-party sign-in (e.g. a Google account)
    async fn sign_in_federated(&self, provider: &str) -> Result<Identity, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Sign-in state notifications; the current value is available at once
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}
