//! # TaskHub Shared Library
//!
//! Domain types and the balance ledger model shared by every TaskHub
//! front-end. This crate performs no I/O.
//!
//! ## Module Organization
//!
//! - `money`: fixed-point coin and dollar amounts
//! - `models`: users, tasks, submissions, payments
//! - `ledger`: cost, admissibility and balance transitions
//! - `validation`: task form validation
//! - `error`: ledger error taxonomy

pub mod error;
pub mod ledger;
pub mod models;
pub mod money;
pub mod validation;

pub use error::{LedgerError, LedgerResult};
pub use money::{Coins, Usd};

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
