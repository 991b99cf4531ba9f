//! Materialization of recurring templates into concrete transactions.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use spese_domain::{new_id, Document, RecurringDraft, RecurringTemplate, Transaction};

use crate::{validation, CoreError};

/// Result of a single expansion pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    /// Newly emitted transactions, in template order then occurrence order.
    pub materialized: Vec<Transaction>,
    /// Templates that still have occurrences left to produce.
    pub updated_templates: Vec<RecurringTemplate>,
}

impl Expansion {
    pub fn is_empty(&self) -> bool {
        self.materialized.is_empty()
    }
}

/// Synthetic identifier of the `index`-th occurrence (0-based) of a template.
pub fn occurrence_id(template_id: &str, index: u32) -> String {
    format!("{template_id}-{index}")
}

/// Emits every occurrence due at or before `now` and advances each template.
///
/// The function is pure: calling it again with the output templates and the
/// same `now` emits nothing. Exhausted templates are dropped from the result.
pub fn expand(templates: &[RecurringTemplate], now: DateTime<Utc>) -> Expansion {
    let mut expansion = Expansion::default();

    for template in templates {
        let mut current = template.clone();
        while current.generated_count < current.count && current.next_due_date <= now {
            let Some(next_due) = current.frequency.advance(current.next_due_date, current.interval)
            else {
                warn!(
                    template = %current.id,
                    "recurring template cannot advance past {}; stopping expansion",
                    current.next_due_date
                );
                break;
            };
            expansion.materialized.push(occurrence_of(&current));
            current.generated_count += 1;
            current.next_due_date = next_due;
        }
        if current.is_exhausted() {
            debug!(template = %current.id, "recurring template exhausted");
        } else {
            expansion.updated_templates.push(current);
        }
    }

    expansion
}

fn occurrence_of(template: &RecurringTemplate) -> Transaction {
    Transaction {
        id: occurrence_id(&template.id, template.generated_count),
        amount: template.amount,
        description: format!(
            "{} ({}/{})",
            template.description,
            template.generated_count + 1,
            template.count
        ),
        category: template.category.clone(),
        subcategory: template.subcategory.clone(),
        kind: template.kind,
        account_id: template.account_id.clone(),
        timestamp: template.next_due_date,
        is_recurring: true,
        recurring_template_id: Some(template.id.clone()),
        calendar_event_id: None,
    }
}

/// Provides document-level helpers around the recurrence engine.
pub struct RecurrenceService;

impl RecurrenceService {
    /// Expands all due occurrences into `document`, returning how many were added.
    ///
    /// Fails without touching the document if an emitted id already exists,
    /// which only happens when a due window is expanded twice without persisting.
    pub fn materialize_due(document: &mut Document, now: DateTime<Utc>) -> Result<usize, CoreError> {
        let expansion = expand(&document.recurring_transactions, now);
        let existing: HashSet<&str> = document
            .transactions
            .iter()
            .map(|txn| txn.id.as_str())
            .collect();
        if let Some(clash) = expansion
            .materialized
            .iter()
            .find(|txn| existing.contains(txn.id.as_str()))
        {
            return Err(CoreError::Integrity(format!(
                "materialized transaction id `{}` already exists",
                clash.id
            )));
        }

        let added = expansion.materialized.len();
        let dropped = document.recurring_transactions.len() - expansion.updated_templates.len();
        document.transactions.extend(expansion.materialized);
        document.recurring_transactions = expansion.updated_templates;
        if added > 0 {
            document.sort_transactions();
            info!(
                materialized = added,
                exhausted = dropped,
                "materialized due recurring transactions"
            );
        }
        Ok(added)
    }

    /// Validates and stores a new recurring series, returning its identifier.
    pub fn create(document: &mut Document, draft: &RecurringDraft) -> Result<String, CoreError> {
        validation::validate_draft(document, &draft.transaction)?;
        if draft.interval == 0 {
            return Err(CoreError::Validation(
                "recurrence interval must be a positive number".into(),
            ));
        }
        if draft.count == 0 {
            return Err(CoreError::Validation(
                "recurrence count must be a positive number".into(),
            ));
        }
        let template = RecurringTemplate::from_draft(new_id(), draft);
        let id = template.id.clone();
        document.recurring_transactions.push(template);
        Ok(id)
    }

    /// Stops a series. Transactions it already produced stay in the ledger.
    pub fn delete(document: &mut Document, id: &str) -> Result<RecurringTemplate, CoreError> {
        let position = document
            .recurring_transactions
            .iter()
            .position(|template| template.id == id)
            .ok_or_else(|| CoreError::TemplateNotFound(id.to_string()))?;
        Ok(document.recurring_transactions.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use spese_domain::{Frequency, TransactionDraft, TransactionKind, CASH_ACCOUNT_ID};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 8, 0, 0).unwrap()
    }

    fn template(frequency: Frequency, interval: u32, count: u32, start: DateTime<Utc>) -> RecurringTemplate {
        RecurringTemplate {
            id: "tpl".into(),
            amount: 700.0,
            description: "Affitto".into(),
            category: "Casa".into(),
            subcategory: String::new(),
            kind: TransactionKind::Expense,
            account_id: CASH_ACCOUNT_ID.into(),
            start_date: start,
            frequency,
            interval,
            count,
            generated_count: 0,
            next_due_date: start,
        }
    }

    #[test]
    fn monthly_series_materializes_all_occurrences_and_exhausts() {
        let start = at(2024, 1, 15);
        let expansion = expand(&[template(Frequency::Monthly, 1, 3, start)], at(2024, 3, 15));

        let stamps: Vec<_> = expansion.materialized.iter().map(|t| t.timestamp).collect();
        assert_eq!(stamps, vec![at(2024, 1, 15), at(2024, 2, 15), at(2024, 3, 15)]);
        assert!(expansion.updated_templates.is_empty());
        assert_eq!(expansion.materialized[0].id, "tpl-0");
        assert_eq!(expansion.materialized[2].id, "tpl-2");
        assert_eq!(expansion.materialized[1].description, "Affitto (2/3)");
        assert!(expansion.materialized.iter().all(|t| t.is_recurring));
        assert_eq!(
            expansion.materialized[0].recurring_template_id.as_deref(),
            Some("tpl")
        );
    }

    #[test]
    fn partial_expansion_keeps_template_active_with_advanced_due_date() {
        let start = at(2024, 1, 1);
        let expansion = expand(&[template(Frequency::Weekly, 1, 10, start)], at(2024, 1, 10));

        assert_eq!(expansion.materialized.len(), 2);
        let remaining = &expansion.updated_templates[0];
        assert_eq!(remaining.generated_count, 2);
        assert_eq!(remaining.next_due_date, at(2024, 1, 15));
    }

    #[test]
    fn expansion_is_idempotent_for_the_same_now() {
        let now = at(2024, 6, 1);
        let first = expand(&[template(Frequency::Monthly, 2, 12, at(2024, 1, 1))], now);
        let second = expand(&first.updated_templates, now);

        assert!(second.materialized.is_empty());
        assert_eq!(second.updated_templates, first.updated_templates);
    }

    #[test]
    fn not_yet_due_template_is_left_untouched() {
        let pending = template(Frequency::Daily, 1, 5, at(2030, 1, 1));
        let expansion = expand(std::slice::from_ref(&pending), at(2024, 1, 1));

        assert!(expansion.is_empty());
        assert_eq!(expansion.updated_templates, vec![pending]);
    }

    #[test]
    fn exhausted_template_emits_nothing_and_is_dropped() {
        let mut spent = template(Frequency::Monthly, 1, 3, at(2024, 1, 15));
        spent.generated_count = 3;
        spent.next_due_date = at(2024, 4, 15);

        let expansion = expand(std::slice::from_ref(&spent), at(2025, 1, 1));
        assert!(expansion.materialized.is_empty());
        assert!(expansion.updated_templates.is_empty());

        let mut doc = Document::new();
        doc.recurring_transactions.push(spent);
        assert_eq!(RecurrenceService::materialize_due(&mut doc, at(2025, 1, 1)).unwrap(), 0);
        assert!(doc.transactions.is_empty());
        assert!(doc.recurring_transactions.is_empty());
    }

    #[test]
    fn materialize_due_rejects_colliding_ids() {
        let mut doc = Document::new();
        doc.recurring_transactions
            .push(template(Frequency::Daily, 1, 2, at(2024, 1, 1)));
        let mut clash = occurrence_of(&doc.recurring_transactions[0]);
        clash.is_recurring = false;
        doc.transactions.push(clash);

        let err = RecurrenceService::materialize_due(&mut doc, at(2024, 1, 5))
            .expect_err("duplicate id must be rejected");
        assert!(matches!(err, CoreError::Integrity(_)));
        assert_eq!(doc.recurring_transactions[0].generated_count, 0);
    }

    #[test]
    fn create_rejects_zero_interval_and_count() {
        let mut doc = Document::new();
        let base = TransactionDraft::expense(10.0, "Palestra", "Sport", CASH_ACCOUNT_ID, at(2024, 1, 1));

        let err = RecurrenceService::create(
            &mut doc,
            &RecurringDraft::new(base.clone(), Frequency::Monthly, 0, 12),
        )
        .expect_err("zero interval");
        assert!(matches!(err, CoreError::Validation(_)));

        let err = RecurrenceService::create(&mut doc, &RecurringDraft::new(base, Frequency::Monthly, 1, 0))
            .expect_err("zero count");
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(doc.recurring_transactions.is_empty());
    }

    #[test]
    fn delete_keeps_materialized_transactions() {
        let mut doc = Document::new();
        let base = TransactionDraft::income(1500.0, "Stipendio", "Lavoro", CASH_ACCOUNT_ID, at(2024, 1, 27));
        let id = RecurrenceService::create(&mut doc, &RecurringDraft::new(base, Frequency::Monthly, 1, 12))
            .unwrap();
        RecurrenceService::materialize_due(&mut doc, at(2024, 3, 1)).unwrap();
        assert_eq!(doc.transactions.len(), 2);

        RecurrenceService::delete(&mut doc, &id).unwrap();
        assert!(doc.recurring_transactions.is_empty());
        assert_eq!(doc.transactions.len(), 2);
    }
}
