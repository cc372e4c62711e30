/// Payment provider contract
///
/// A payment goes through two provider calls around one service call:
///
/// 1. `tokenize` turns card details into a payment method id
/// 2. the TaskHub service creates a payment intent for the amount
/// 3. `confirm` charges (or pays out) against that intent
///
/// Balances change only after step 3 succeeds.

use crate::api::PaymentIntent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use taskhub_shared::Usd;

/// Payment provider errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    /// Charge refused by the card issuer
    #[error("card declined: {0}")]
    Declined(String),

    /// Card details rejected during tokenization
    #[error("invalid card: {0}")]
    InvalidCard(String),

    /// Provider unreachable or erroring
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),
}

/// Opaque card handle passed straight to the provider
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    token: String,
}

impl CardDetails {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Raw value, for provider implementations only
    pub fn expose(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CardDetails(**redacted**)")
    }
}

/// Tokenized payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
}

/// Confirmed charge or payout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub id: String,
    pub amount: Usd,
}

/// Card processor
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &str;

    /// Exchanges card details for a payment method
    async fn tokenize(&self, card: &CardDetails) -> Result<PaymentMethod, PaymentError>;

    /// Confirms `amount` against a service-created intent
    async fn confirm(
        &self,
        method: &PaymentMethod,
        intent: &PaymentIntent,
        amount: Usd,
    ) -> Result<PaymentConfirmation, PaymentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_details_are_redacted() {
        let card = CardDetails::new("4242424242424242");
        assert_eq!(format!("{:?}", card), "CardDetails(**redacted**)");
        assert_eq!(card.expose(), "4242424242424242");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PaymentError::InvalidCard("expired".to_string()).to_string(),
            "invalid card: expired"
        );
    }
}
