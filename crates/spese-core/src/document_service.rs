//! Whole-document lifecycle: creation, hydration of stored snapshots, reset.

use std::collections::HashSet;

use tracing::{info, warn};

use spese_domain::{
    builtin_categories, normalize_name, Account, Document, DocumentSnapshot, CASH_ACCOUNT_ID,
    CURRENT_SCHEMA_VERSION, DEFAULT_CATEGORY,
};

use crate::{CoreError, TaxonomyReconciler};

/// A document ready for use, plus what had to change to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct Hydrated {
    pub document: Document,
    pub migrations: Vec<String>,
    pub warnings: Vec<String>,
}

pub struct DocumentService;

impl DocumentService {
    pub fn create() -> Document {
        Document::new()
    }

    /// Turns a stored snapshot into a canonical document.
    ///
    /// Re-injects the cash account, lifts legacy categories and merges the
    /// built-in taxonomy. Dangling references are reported, not repaired.
    pub fn hydrate(snapshot: DocumentSnapshot) -> Result<Hydrated, CoreError> {
        if snapshot.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(CoreError::Storage(format!(
                "document schema v{} is newer than supported v{}",
                snapshot.schema_version, CURRENT_SCHEMA_VERSION
            )));
        }

        let DocumentSnapshot {
            transactions,
            mut accounts,
            recurring_transactions,
            categories,
            budgets,
            calendar_sync_enabled,
            schema_version: _,
        } = snapshot;
        let mut migrations = Vec::new();

        if !accounts.iter().any(|account| account.id == CASH_ACCOUNT_ID) {
            accounts.insert(0, Account::cash());
            migrations.push("re-created missing cash account".to_string());
        }

        let builtins = builtin_categories();
        let categories = match categories {
            None => {
                migrations.push("installed built-in categories".to_string());
                builtins
            }
            Some(persisted) => {
                let legacy = persisted.iter().filter(|entry| entry.is_legacy()).count();
                if legacy > 0 {
                    migrations.push(format!("converted {legacy} legacy category names"));
                }
                let before = persisted.len();
                let merged = TaxonomyReconciler::reconcile(persisted, &builtins);
                if merged.len() > before {
                    migrations.push(format!(
                        "added {} built-in categories",
                        merged.len() - before
                    ));
                }
                merged
            }
        };

        let mut document = Document {
            transactions,
            accounts,
            recurring_transactions,
            categories,
            budgets,
            calendar_sync_enabled,
            schema_version: CURRENT_SCHEMA_VERSION,
        };
        if let Some(note) = Self::canonicalize_fallback(&mut document) {
            migrations.push(note);
        }
        document.sort_transactions();

        let warnings = Self::warnings(&document);
        for note in &migrations {
            info!(migration = %note, "document migrated on load");
        }
        for message in &warnings {
            warn!(warning = %message, "document integrity warning");
        }
        Ok(Hydrated {
            document,
            migrations,
            warnings,
        })
    }

    /// A persisted fallback differing only by case is renamed to the canonical spelling.
    fn canonicalize_fallback(document: &mut Document) -> Option<String> {
        if document.category(DEFAULT_CATEGORY).is_some() {
            return None;
        }
        let wanted = normalize_name(DEFAULT_CATEGORY);
        let entry = document
            .categories
            .iter_mut()
            .find(|category| normalize_name(&category.name) == wanted)?;
        let previous = std::mem::replace(&mut entry.name, DEFAULT_CATEGORY.to_string());
        for txn in document
            .transactions
            .iter_mut()
            .filter(|txn| txn.category == previous)
        {
            txn.category = DEFAULT_CATEGORY.into();
        }
        for template in document
            .recurring_transactions
            .iter_mut()
            .filter(|template| template.category == previous)
        {
            template.category = DEFAULT_CATEGORY.into();
        }
        if let Some(cap) = document.budgets.categories.remove(&previous) {
            document.budgets.categories.insert(DEFAULT_CATEGORY.into(), cap);
        }
        Some(format!("renamed category `{previous}` to `{DEFAULT_CATEGORY}`"))
    }

    /// Detects dangling references and other anomalies within a document.
    pub fn warnings(document: &Document) -> Vec<String> {
        let account_ids: HashSet<&str> = document.accounts.iter().map(|a| a.id.as_str()).collect();
        let mut warnings = Vec::new();

        let mut check_reference = |kind: &str, id: &str, account: &str, category: &str, sub: &str| {
            if !account_ids.contains(account) {
                warnings.push(format!("{kind} {id} references unknown account {account}"));
            }
            match document.category(category) {
                None => warnings.push(format!(
                    "{kind} {id} references missing category {category}"
                )),
                Some(entry) if !sub.is_empty() && !entry.has_subcategory(sub) => warnings.push(format!(
                    "{kind} {id} references missing subcategory {category} / {sub}"
                )),
                Some(_) => {}
            }
        };
        for txn in &document.transactions {
            check_reference("transaction", &txn.id, &txn.account_id, &txn.category, &txn.subcategory);
        }
        for template in &document.recurring_transactions {
            check_reference(
                "recurring template",
                &template.id,
                &template.account_id,
                &template.category,
                &template.subcategory,
            );
        }

        for template in &document.recurring_transactions {
            if template.generated_count > template.count {
                warnings.push(format!(
                    "recurring template {} generated {} of {} occurrences",
                    template.id, template.generated_count, template.count
                ));
            }
            if template.interval == 0 {
                warnings.push(format!("recurring template {} has a zero interval", template.id));
            }
        }

        let mut seen = HashSet::new();
        for txn in &document.transactions {
            if !seen.insert(txn.id.as_str()) {
                warnings.push(format!("duplicate transaction id {}", txn.id));
            }
        }
        warnings
    }

    /// Clears all user data. Only the cash account and the built-in taxonomy remain.
    pub fn reset(document: &mut Document) {
        *document = Document::new();
        info!("document reset to defaults");
    }

    pub fn set_calendar_sync(document: &mut Document, enabled: bool) {
        document.calendar_sync_enabled = enabled;
    }

    /// Serializes the document for an opaque backup target.
    pub fn to_blob(document: &Document) -> Result<Vec<u8>, CoreError> {
        Ok(serde_json::to_vec_pretty(document)?)
    }

    pub fn from_blob(blob: &[u8]) -> Result<DocumentSnapshot, CoreError> {
        Ok(serde_json::from_slice(blob)?)
    }
}
