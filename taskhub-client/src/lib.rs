//! # TaskHub Client Library
//!
//! Client side of the TaskHub micro-task marketplace: the remote API
//! contract and its HTTP implementation, payment and identity providers,
//! the session and balance cache, and the marketplace flows that tie them
//! to the ledger model in `taskhub-shared`.
//!
//! ## Modules
//!
//! - `api`: TaskHub service contract and reqwest client
//! - `providers`: payment and identity provider traits plus mocks
//! - `session`: signed-in identity and server session
//! - `cache`: read-through balance cache with optimistic updates
//! - `marketplace`: user-facing flows
//! - `dashboard`: read-side views (stats, search, leaderboard)
//! - `config`: environment configuration
//! - `logging`: tracing subscriber set-up
//! - `error`: client error type
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskhub_client::api::HttpTaskHubApi;
//! use taskhub_client::config::ClientConfig;
//! use taskhub_client::marketplace::Marketplace;
//! use taskhub_client::providers::{MockIdentityProvider, MockPaymentProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let market = Marketplace::new(
//!     Arc::new(HttpTaskHubApi::new(config.api.clone())?),
//!     Arc::new(MockPaymentProvider::new()),
//!     Arc::new(MockIdentityProvider::new()),
//!     config.ledger,
//! );
//! for task in market.available_tasks().await? {
//!     println!("{} pays {}", task.task.title(), task.task.payable_amount());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod marketplace;
pub mod providers;
pub mod session;

pub use error::{ClientError, ClientResult};
