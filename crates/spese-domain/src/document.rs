//! The canonical persisted document and its lenient on-disk counterpart.

use serde::{Deserialize, Serialize};

use crate::{
    account::{Account, CASH_ACCOUNT_ID},
    budget::Budgets,
    category::{builtin_categories, Category, PersistedCategory},
    recurring::RecurringTemplate,
    transaction::Transaction,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Whole-ledger state: every account, entry, template, category and budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub recurring_transactions: Vec<RecurringTemplate>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub budgets: Budgets,
    #[serde(default)]
    pub calendar_sync_enabled: bool,
    #[serde(default = "Document::schema_version_default")]
    pub schema_version: u8,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A fresh document holding only the cash account and the built-in taxonomy.
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            accounts: vec![Account::cash()],
            recurring_transactions: Vec::new(),
            categories: builtin_categories(),
            budgets: Budgets::default(),
            calendar_sync_enabled: false,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_mut(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == id)
    }

    pub fn has_cash_account(&self) -> bool {
        self.account(CASH_ACCOUNT_ID).is_some()
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories
            .iter_mut()
            .find(|category| category.name == name)
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn transaction_mut(&mut self, id: &str) -> Option<&mut Transaction> {
        self.transactions.iter_mut().find(|txn| txn.id == id)
    }

    pub fn template(&self, id: &str) -> Option<&RecurringTemplate> {
        self.recurring_transactions
            .iter()
            .find(|template| template.id == id)
    }

    /// Keeps transactions ordered newest first.
    pub fn sort_transactions(&mut self) {
        self.transactions
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

/// Document as read from storage, before hydration.
///
/// Every field is optional or defaulted so that older payloads (no cash
/// account, categories stored as bare names, missing budgets) still parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub recurring_transactions: Vec<RecurringTemplate>,
    #[serde(default)]
    pub categories: Option<Vec<PersistedCategory>>,
    #[serde(default)]
    pub budgets: Budgets,
    #[serde(default)]
    pub calendar_sync_enabled: bool,
    #[serde(default = "Document::schema_version_default")]
    pub schema_version: u8,
}

impl From<Document> for DocumentSnapshot {
    fn from(document: Document) -> Self {
        Self {
            transactions: document.transactions,
            accounts: document.accounts,
            recurring_transactions: document.recurring_transactions,
            categories: Some(
                document
                    .categories
                    .into_iter()
                    .map(PersistedCategory::from)
                    .collect(),
            ),
            budgets: document.budgets,
            calendar_sync_enabled: document.calendar_sync_enabled,
            schema_version: document.schema_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_cash_and_builtins() {
        let doc = Document::new();
        assert!(doc.has_cash_account());
        assert!(doc.category(crate::DEFAULT_CATEGORY).is_some());
        assert_eq!(doc.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn snapshot_parses_minimal_legacy_payload() {
        let json = r#"{"transactions": [], "accounts": [{"id": "1", "bank": "ING"}],
            "categories": ["Cibo", "Altro"]}"#;
        let snapshot: DocumentSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.accounts.len(), 1);
        assert_eq!(snapshot.categories.as_ref().map(Vec::len), Some(2));
        assert!(!snapshot.calendar_sync_enabled);
        assert_eq!(snapshot.budgets, Budgets::default());
    }

    #[test]
    fn document_serializes_camel_case_keys() {
        let value = serde_json::to_value(Document::new()).unwrap();
        assert!(value.get("recurringTransactions").is_some());
        assert!(value.get("calendarSyncEnabled").is_some());
        assert!(value.get("schemaVersion").is_some());
    }
}
