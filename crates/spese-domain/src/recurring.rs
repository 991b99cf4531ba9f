//! Recurring transaction templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;
use crate::transaction::TransactionDraft;

/// A series definition that the recurrence engine materializes into transactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTemplate {
    pub id: String,
    pub amount: f64,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub account_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_date: DateTime<Utc>,
    pub frequency: Frequency,
    pub interval: u32,
    pub count: u32,
    #[serde(default)]
    pub generated_count: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub next_due_date: DateTime<Utc>,
}

impl RecurringTemplate {
    /// Builds a fresh template whose first occurrence is the draft's timestamp.
    pub fn from_draft(id: impl Into<String>, draft: &RecurringDraft) -> Self {
        let base = &draft.transaction;
        Self {
            id: id.into(),
            amount: base.amount,
            description: base.description.trim().to_string(),
            category: base.category.clone(),
            subcategory: base.subcategory.clone(),
            kind: base.kind,
            account_id: base.account_id.clone(),
            start_date: base.timestamp,
            frequency: draft.frequency,
            interval: draft.interval,
            count: draft.count,
            generated_count: 0,
            next_due_date: base.timestamp,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.generated_count >= self.count
    }

    pub fn remaining(&self) -> u32 {
        self.count.saturating_sub(self.generated_count)
    }
}

impl Identifiable for RecurringTemplate {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Amounted for RecurringTemplate {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Displayable for RecurringTemplate {
    fn display_label(&self) -> String {
        format!(
            "{} ({}, {}/{})",
            self.description,
            self.frequency.label(self.interval),
            self.generated_count,
            self.count
        )
    }
}

/// User-supplied fields for a new recurring series.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringDraft {
    pub transaction: TransactionDraft,
    pub frequency: Frequency,
    pub interval: u32,
    pub count: u32,
}

impl RecurringDraft {
    pub fn new(transaction: TransactionDraft, frequency: Frequency, interval: u32, count: u32) -> Self {
        Self {
            transaction,
            frequency,
            interval,
            count,
        }
    }
}
