use serde::{Deserialize, Serialize};

use crate::common::*;

/// Identifier of the reserved cash account.
pub const CASH_ACCOUNT_ID: &str = "CASH";

/// Represents a bank account, card, or the cash wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub bank: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub description: String,
}

impl Account {
    /// Creates an account with a freshly generated identifier.
    pub fn new(
        bank: impl Into<String>,
        number: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            bank: bank.into(),
            number: number.into(),
            description: description.into(),
        }
    }

    /// The reserved wallet account that every document carries.
    pub fn cash() -> Self {
        Self {
            id: CASH_ACCOUNT_ID.into(),
            bank: "Contanti".into(),
            number: String::new(),
            description: "Portafoglio".into(),
        }
    }

    pub fn is_cash(&self) -> bool {
        self.id == CASH_ACCOUNT_ID
    }
}

impl Identifiable for Account {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Displayable for Account {
    fn display_label(&self) -> String {
        if self.description.is_empty() {
            self.bank.clone()
        } else {
            format!("{} ({})", self.bank, self.description)
        }
    }
}

/// User-supplied fields for creating or editing an account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDraft {
    pub bank: String,
    pub number: String,
    pub description: String,
}

impl AccountDraft {
    pub fn new(
        bank: impl Into<String>,
        number: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            bank: bank.into(),
            number: number.into(),
            description: description.into(),
        }
    }
}
