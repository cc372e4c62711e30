/// Deterministic provider mocks for tests and demos
///
/// # Payment behaviour
///
/// Cards are matched on their raw value:
///
/// - `4000000000000002`: declined at confirmation (`card_declined`)
/// - `4000000000009995`: declined at confirmation (`insufficient_funds`)
/// - empty or non-digit values: rejected at tokenization
/// - anything else: succeeds
///
/// [`MockPaymentProvider::set_unavailable`] makes every call fail, which is
/// how tests simulate a provider outage.
///
/// # Example
///
/// ```
/// use taskhub_client::api::PaymentIntent;
/// use taskhub_client::providers::{CardDetails, MockPaymentProvider, PaymentProvider};
/// use taskhub_shared::Usd;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = MockPaymentProvider::new();
/// let method = provider.tokenize(&CardDetails::new("4242424242424242")).await?;
/// let confirmation = provider
///     .confirm(&method, &PaymentIntent::default(), Usd::whole(10))
///     .await?;
/// assert_eq!(confirmation.amount, Usd::whole(10));
/// # Ok(())
/// # }
/// ```

use super::identity::{Credentials, Identity, IdentityError, IdentityProvider, SignUp};
use super::payment::{
    CardDetails, PaymentConfirmation, PaymentError, PaymentMethod, PaymentProvider,
};
use crate::api::PaymentIntent;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use taskhub_shared::Usd;
use tokio::sync::watch;
use uuid::Uuid;

const DECLINED_CARD: &str = "4000000000000002";
const NO_FUNDS_CARD: &str = "4000000000009995";

/// Mock payment provider
#[derive(Debug, Default)]
pub struct MockPaymentProvider {
    unavailable: AtomicBool,
    /// Card value behind each issued payment method id
    methods: Mutex<HashMap<String, String>>,
    confirmations: Mutex<Vec<PaymentConfirmation>>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles the simulated outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Confirmed payments so far
    pub fn confirmations(&self) -> Vec<PaymentConfirmation> {
        self.confirmations
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), PaymentError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PaymentError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn tokenize(&self, card: &CardDetails) -> Result<PaymentMethod, PaymentError> {
        self.check_available()?;

        let number = card.expose().trim();
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::InvalidCard(
                "card number must be digits".to_string(),
            ));
        }

        let id = format!("pm_{}", Uuid::new_v4().simple());
        if let Ok(mut methods) = self.methods.lock() {
            methods.insert(id.clone(), number.to_string());
        }

        tracing::debug!(method_id = %id, "Mock payment method issued");
        Ok(PaymentMethod { id })
    }

    async fn confirm(
        &self,
        method: &PaymentMethod,
        intent: &PaymentIntent,
        amount: Usd,
    ) -> Result<PaymentConfirmation, PaymentError> {
        self.check_available()?;

        let card = self
            .methods
            .lock()
            .ok()
            .and_then(|m| m.get(&method.id).cloned())
            .ok_or_else(|| PaymentError::InvalidCard("unknown payment method".to_string()))?;

        match card.as_str() {
            DECLINED_CARD => return Err(PaymentError::Declined("card_declined".to_string())),
            NO_FUNDS_CARD => {
                return Err(PaymentError::Declined("insufficient_funds".to_string()))
            }
            _ => {}
        }

        let id = intent
            .id
            .clone()
            .unwrap_or_else(|| format!("pi_{}", Uuid::new_v4().simple()));
        let confirmation = PaymentConfirmation { id, amount };

        if let Ok(mut confirmations) = self.confirmations.lock() {
            confirmations.push(confirmation.clone());
        }

        tracing::debug!(payment_id = %confirmation.id, %amount, "Mock payment confirmed");
        Ok(confirmation)
    }
}

struct Account {
    password: String,
    identity: Identity,
}

/// Mock identity provider backed by an in-memory account table
pub struct MockIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    state: watch::Sender<Option<Identity>>,
    unavailable: AtomicBool,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            state,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), IdentityError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }

    fn publish(&self, identity: Option<Identity>) {
        self.state.send_replace(identity);
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn create_account(&self, form: &SignUp) -> Result<Identity, IdentityError> {
        self.check_available()?;

        if form.credentials.password.len() < 6 {
            return Err(IdentityError::WeakPassword(
                "must be at least 6 characters".to_string(),
            ));
        }

        let email = form.credentials.email.trim().to_ascii_lowercase();
        let identity = {
            let mut accounts = self
                .accounts
                .lock()
                .map_err(|_| IdentityError::Unavailable("account table poisoned".to_string()))?;
            if accounts.contains_key(&email) {
                return Err(IdentityError::AccountExists(email));
            }

            let identity = Identity {
                uid: Uuid::new_v4().to_string(),
                email: email.clone(),
                display_name: form.display_name.clone(),
                photo_url: form.photo_url.clone(),
            };
            accounts.insert(
                email,
                Account {
                    password: form.credentials.password.clone(),
                    identity: identity.clone(),
                },
            );
            identity
        };

        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, IdentityError> {
        self.check_available()?;

        let email = credentials.email.trim().to_ascii_lowercase();
        let identity = self
            .accounts
            .lock()
            .ok()
            .and_then(|accounts| {
                accounts
                    .get(&email)
                    .filter(|a| a.password == credentials.password)
                    .map(|a| a.identity.clone())
            })
            .ok_or(IdentityError::InvalidCredentials)?;

        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in_federated(&self, provider: &str) -> Result<Identity, IdentityError> {
        self.check_available()?;

        let email = format!("{}.user@example.com", provider.to_ascii_lowercase());
        let identity = {
            let mut accounts = self
                .accounts
                .lock()
                .map_err(|_| IdentityError::Unavailable("account table poisoned".to_string()))?;
            accounts
                .entry(email.clone())
                .or_insert_with(|| Account {
                    password: String::new(),
                    identity: Identity {
                        uid: Uuid::new_v4().to_string(),
                        email,
                        display_name: format!("{} user", provider),
                        photo_url: None,
                    },
                })
                .identity
                .clone()
        };

        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.publish(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up(email: &str, password: &str) -> SignUp {
        SignUp {
            credentials: Credentials {
                email: email.to_string(),
                password: password.to_string(),
            },
            display_name: "Wanda".to_string(),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_declined_card() {
        let provider = MockPaymentProvider::new();
        let method = provider
            .tokenize(&CardDetails::new(DECLINED_CARD))
            .await
            .unwrap();

        let result = provider
            .confirm(&method, &PaymentIntent::default(), Usd::whole(1))
            .await;
        assert_eq!(
            result,
            Err(PaymentError::Declined("card_declined".to_string()))
        );
        assert!(provider.confirmations().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_card_and_outage() {
        let provider = MockPaymentProvider::new();
        assert!(matches!(
            provider.tokenize(&CardDetails::new("not-a-card")).await,
            Err(PaymentError::InvalidCard(_))
        ));

        provider.set_unavailable(true);
        assert!(matches!(
            provider.tokenize(&CardDetails::new("4242424242424242")).await,
            Err(PaymentError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_confirmation_uses_intent_id() {
        let provider = MockPaymentProvider::new();
        let method = provider
            .tokenize(&CardDetails::new("4242424242424242"))
            .await
            .unwrap();
        let intent = PaymentIntent {
            client_secret: Some("secret".to_string()),
            id: Some("pi_123".to_string()),
        };

        let confirmation = provider
            .confirm(&method, &intent, Usd::whole(35))
            .await
            .unwrap();
        assert_eq!(confirmation.id, "pi_123");
        assert_eq!(provider.confirmations().len(), 1);
    }

    #[tokio::test]
    async fn test_account_lifecycle_publishes_state() {
        let provider = MockIdentityProvider::new();
        let rx = provider.subscribe();
        assert!(rx.borrow().is_none());

        let identity = provider
            .create_account(&sign_up("W@Example.com", "hunter22"))
            .await
            .unwrap();
        assert_eq!(identity.email, "w@example.com");
        assert_eq!(rx.borrow().as_ref(), Some(&identity));

        provider.sign_out().await.unwrap();
        assert!(rx.borrow().is_none());

        let again = provider
            .sign_in(&Credentials {
                email: "w@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(again.uid, identity.uid);
    }

    #[tokio::test]
    async fn test_account_errors() {
        let provider = MockIdentityProvider::new();
        assert!(matches!(
            provider.create_account(&sign_up("a@example.com", "123")).await,
            Err(IdentityError::WeakPassword(_))
        ));

        provider
            .create_account(&sign_up("a@example.com", "123456"))
            .await
            .unwrap();
        assert!(matches!(
            provider.create_account(&sign_up("a@example.com", "123456")).await,
            Err(IdentityError::AccountExists(_))
        ));

        let wrong = Credentials {
            email: "a@example.com".to_string(),
            password: "nope".to_string(),
        };
        assert_eq!(
            provider.sign_in(&wrong).await,
            Err(IdentityError::InvalidCredentials)
        );
    }
}
