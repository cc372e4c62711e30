/// Ledger error taxonomy
///
/// Every variant here is detected locally and synchronously, before any
/// request leaves the client. Remote failures live in the client crate.

use crate::models::submission::SubmissionStatus;
use crate::money::Coins;

/// Ledger result type alias
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Reasons a ledger-affecting action is inadmissible
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A form field failed validation
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Balance does not cover the requested debit
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientFunds { required: Coins, available: Coins },

    /// Withdrawal request is under the minimum threshold
    #[error("minimum withdrawal is {minimum} coins, requested {requested}")]
    BelowMinimum { requested: Coins, minimum: Coins },

    /// Submission was already resolved
    #[error("cannot move submission from {from} to {to}")]
    InvalidStateTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },
}

impl LedgerError {
    /// Builds a validation error for a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Amount still missing for an `InsufficientFunds` error
    pub fn shortfall(&self) -> Option<Coins> {
        match self {
            LedgerError::InsufficientFunds {
                required,
                available,
            } => Some(required.saturating_sub(*available)),
            _ => None,
        }
    }

    /// Short machine-readable code, used in logs
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation { .. } => "validation_error",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::BelowMinimum { .. } => "below_minimum",
            LedgerError::InvalidStateTransition { .. } => "invalid_state_transition",
        }
    }
}
