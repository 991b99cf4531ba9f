//! spese-domain
//!
//! Pure domain models (Document, Account, Category, Transaction, RecurringTemplate, Budgets).
//! No I/O, no CLI, no storage. Only data types, reserved names and calendar helpers.

pub mod account;
pub mod budget;
pub mod category;
pub mod common;
pub mod document;
pub mod recurring;
pub mod transaction;

pub use account::*;
pub use budget::*;
pub use category::*;
pub use common::*;
pub use document::*;
pub use recurring::*;
pub use transaction::*;
