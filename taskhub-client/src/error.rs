/// Client error type
///
/// Wraps the local ledger taxonomy and adds the remote-failure family. The
/// split matters to callers: local errors mean nothing was sent; remote
/// errors mean a request was attempted and the displayed state must be
/// reconciled with the server.
///
/// # Example
///
/// ```
/// use taskhub_client::error::ClientError;
/// use taskhub_shared::{Coins, LedgerError};
///
/// let err: ClientError = LedgerError::InsufficientFunds {
///     required: Coins::whole(40),
///     available: Coins::whole(30),
/// }
/// .into();
/// assert!(err.is_local());
/// assert_eq!(err.user_message(), "Insufficient balance. You need 10.00 more.");
/// ```

use crate::providers::identity::IdentityError;
use crate::providers::payment::PaymentError;
use taskhub_shared::LedgerError;

/// Client result type alias
pub type ClientResult<T> = Result<T, ClientError>;

/// Unified client error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Rejected by the ledger model; no request was sent
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Remote service answered with an error status
    #[error("remote service returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// Request never completed (connect, timeout, TLS)
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Card tokenization or confirmation failed
    #[error("payment failed: {0}")]
    Payment(#[from] PaymentError),

    /// Identity provider failed
    #[error("identity provider error: {0}")]
    Identity(#[from] IdentityError),

    /// No signed-in identity
    #[error("not signed in")]
    NotAuthenticated,

    /// Signed-in user may not perform this action
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Referenced record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A compound action half-applied and could not be undone
    #[error("{step} failed after earlier steps succeeded ({cause}); compensation failed: {compensation}")]
    PartialFailure {
        step: String,
        cause: String,
        compensation: String,
    },
}

impl ClientError {
    /// Detected before any request was sent
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ClientError::Ledger(_) | ClientError::NotAuthenticated | ClientError::Forbidden(_)
        )
    }

    /// A request was attempted and failed (includes provider declines)
    pub fn is_remote_failure(&self) -> bool {
        !self.is_local()
    }

    /// Text for a dismissable notification
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Ledger(LedgerError::InsufficientFunds {
                required,
                available,
            }) => format!(
                "Insufficient balance. You need {} more.",
                required.saturating_sub(*available)
            ),
            ClientError::Ledger(LedgerError::BelowMinimum { minimum, .. }) => {
                format!("Minimum withdrawal amount is {} coins", minimum.whole_coins())
            }
            ClientError::Ledger(LedgerError::Validation { field, message }) => {
                format!("{} {}", field.replace('_', " "), message)
            }
            ClientError::Ledger(LedgerError::InvalidStateTransition { from, .. }) => {
                format!("This submission has already been {}", from)
            }
            ClientError::Remote { message, .. } => message.clone(),
            ClientError::Transport(_) => {
                "Could not reach the server. Please try again.".to_string()
            }
            ClientError::Decode(_) => "The server sent an unexpected response.".to_string(),
            ClientError::Payment(err) => err.to_string(),
            ClientError::Identity(err) => err.to_string(),
            ClientError::NotAuthenticated => "Please sign in first.".to_string(),
            ClientError::Forbidden(msg) => msg.clone(),
            ClientError::NotFound(what) => format!("{} was not found", what),
            ClientError::PartialFailure { step, .. } => format!(
                "The {} step failed and could not be rolled back. Please contact support.",
                step
            ),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ClientError::Remote {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        if err.is_decode() {
            return ClientError::Decode(err.to_string());
        }
        ClientError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
