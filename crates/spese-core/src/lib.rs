//! spese-core
//!
//! Ledger engines and services: recurrence, aggregation, mutations, taxonomy
//! reconciliation and the single document owner.
//! Depends on spese-domain. No CLI, no terminal I/O, no direct filesystem access.

pub mod account_service;
pub mod budget_service;
pub mod category_service;
pub mod document_service;
pub mod error;
pub mod manager;
pub mod recurrence_service;
pub mod storage;
pub mod summary_service;
pub mod sync;
pub mod taxonomy;
pub mod time;
pub mod transaction_service;
mod validation;

pub use account_service::*;
pub use budget_service::*;
pub use category_service::*;
pub use document_service::*;
pub use error::{CoreError, SyncError};
pub use manager::*;
pub use recurrence_service::*;
pub use storage::*;
pub use summary_service::*;
pub use sync::*;
pub use taxonomy::*;
pub use time::{Clock, FixedClock};
pub use transaction_service::*;

#[cfg(test)]
mod tests;
