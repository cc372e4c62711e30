/// External providers
///
/// Card processing and identity are owned by third parties. The client only
/// talks to them through the traits defined here, so the flows can run
/// against the deterministic mocks in tests and demos.
///
/// # Providers
///
/// - **Payment**: tokenizes card details and confirms charges/payouts
/// - **Identity**: accounts, sign-in and sign-in state notifications
///
/// # Example
///
/// ```
/// use taskhub_client::providers::{MockPaymentProvider, PaymentProvider};
///
/// let provider = MockPaymentProvider::new();
/// assert_eq!(provider.name(), "mock");
/// ```

pub mod identity;
pub mod mock;
pub mod payment;

pub use identity::{Credentials, Identity, IdentityError, IdentityProvider, SignUp};
pub use mock::{MockIdentityProvider, MockPaymentProvider};
pub use payment::{CardDetails, PaymentConfirmation, PaymentError, PaymentMethod, PaymentProvider};
