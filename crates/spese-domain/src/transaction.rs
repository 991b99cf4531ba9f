//! Domain models for concrete ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
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
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
}

impl Transaction {
    /// Builds a manual transaction from a draft under the supplied identifier.
    pub fn from_draft(id: impl Into<String>, draft: &TransactionDraft) -> Self {
        Self {
            id: id.into(),
            amount: draft.amount,
            description: draft.description.trim().to_string(),
            category: draft.category.clone(),
            subcategory: draft.subcategory.clone(),
            kind: draft.kind,
            account_id: draft.account_id.clone(),
            timestamp: draft.timestamp,
            is_recurring: false,
            recurring_template_id: None,
            calendar_event_id: None,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    /// Amount with the sign it contributes to an account balance.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Amounted for Transaction {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        format!("{} [{} {:.2}]", self.description, self.kind, self.amount)
    }
}

/// User-supplied fields for creating or editing a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub amount: f64,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub kind: TransactionKind,
    pub account_id: String,
    pub timestamp: DateTime<Utc>,
}

impl TransactionDraft {
    pub fn expense(
        amount: f64,
        description: impl Into<String>,
        category: impl Into<String>,
        account_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            amount,
            description: description.into(),
            category: category.into(),
            subcategory: String::new(),
            kind: TransactionKind::Expense,
            account_id: account_id.into(),
            timestamp,
        }
    }

    pub fn income(
        amount: f64,
        description: impl Into<String>,
        category: impl Into<String>,
        account_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: TransactionKind::Income,
            ..Self::expense(amount, description, category, account_id, timestamp)
        }
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = subcategory.into();
        self
    }
}

impl From<&Transaction> for TransactionDraft {
    fn from(txn: &Transaction) -> Self {
        Self {
            amount: txn.amount,
            description: txn.description.clone(),
            category: txn.category.clone(),
            subcategory: txn.subcategory.clone(),
            kind: txn.kind,
            account_id: txn.account_id.clone(),
            timestamp: txn.timestamp,
        }
    }
}
