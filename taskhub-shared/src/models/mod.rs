/// Domain models for TaskHub
///
/// Plain data types mirroring the documents the remote service stores.
/// None of them perform I/O.
///
/// # Models
///
/// - `user`: accounts, roles and starting balances
/// - `task`: task drafts and funded tasks
/// - `submission`: worker submissions and the review state machine
/// - `payment`: coin packages, checkout records, withdrawal quotes

pub mod payment;
pub mod submission;
pub mod task;
pub mod user;

pub use payment::{CoinPackage, PaymentRecord, WithdrawalQuote};
pub use submission::{Decision, Submission, SubmissionStatus, WorkerRef};
pub use task::{Creator, Task, TaskDraft, TaskStatus};
pub use user::{NewUser, Role, User};
