#![doc(test(attr(deny(warnings))))]

//! Spese is a personal-finance ledger: accounts, categorized income and
//! expenses, recurring series, monthly budgets and backups, driven from a
//! scriptable command shell.

pub mod cli;
pub mod errors;
pub mod utils;

pub use errors::AppError;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter.
pub fn init() {
    init_with_filter(None);
}

/// Initializes global tracing, adding `directive` (e.g. `spese_core=debug`) when given.
/// Only the first call has an effect.
pub fn init_with_filter(directive: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(directive);
        tracing::debug!("spese tracing initialized");
    });
}
