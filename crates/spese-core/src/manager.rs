//! Single owner of the canonical document.
//!
//! Every write goes through [`DocumentManager::commit`]: the operation runs
//! against a clone, the clone replaces the live document only on success and
//! the whole document is saved while the lock is still held. External calendar
//! correlation happens afterwards and never rolls a commit back.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use spese_domain::{
    AccountDraft, Category, Document, DocumentSnapshot, RecurringDraft, RecurringTemplate,
    Transaction, TransactionDraft,
};

use crate::{
    AccountRemoval, AccountService, AggregateFilter, AggregateView, BackupInfo, BackupTarget,
    BudgetProgress, BudgetService, CalendarSync, CategoryService, Clock, CoreError,
    DocumentService, DocumentStorage, RecurrenceService, RenamePolicy, SummaryService,
    SyncOutcome, TransactionService,
};

/// Outcome of a write that reached the in-memory document.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed<T> {
    pub value: T,
    /// Set when saving to storage failed. The in-memory change is kept.
    pub persist_error: Option<String>,
    /// Calendar correlation results, in the order they were attempted.
    pub sync: Vec<SyncOutcome>,
}

impl<T> Committed<T> {
    fn new(value: T, persist_error: Option<String>) -> Self {
        Self {
            value,
            persist_error,
            sync: Vec::new(),
        }
    }

    pub fn is_durable(&self) -> bool {
        self.persist_error.is_none()
    }

    pub fn sync_failures(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.sync.iter().filter(|outcome| outcome.is_failure())
    }
}

/// What happened while bringing a stored document into memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub fresh: bool,
    pub migrations: Vec<String>,
    pub warnings: Vec<String>,
    pub materialized: usize,
}

pub struct DocumentManager {
    document: Mutex<Document>,
    storage: Box<dyn DocumentStorage>,
    clock: Box<dyn Clock>,
    calendar: Option<Box<dyn CalendarSync>>,
    rename_policy: RenamePolicy,
    load_report: LoadReport,
}

impl DocumentManager {
    /// Loads and hydrates the stored document (or starts a fresh one) and
    /// materializes due recurring occurrences once. The document is written
    /// back only when it is new, was migrated or gained occurrences.
    pub fn open(storage: Box<dyn DocumentStorage>, clock: Box<dyn Clock>) -> Result<Self, CoreError> {
        let (mut document, mut report) = match storage.load()? {
            Some(snapshot) => {
                let hydrated = DocumentService::hydrate(snapshot)?;
                let report = LoadReport {
                    fresh: false,
                    migrations: hydrated.migrations,
                    warnings: hydrated.warnings,
                    materialized: 0,
                };
                (hydrated.document, report)
            }
            None => (
                DocumentService::create(),
                LoadReport {
                    fresh: true,
                    ..LoadReport::default()
                },
            ),
        };

        report.materialized = RecurrenceService::materialize_due(&mut document, clock.now())?;
        let changed = report.fresh || !report.migrations.is_empty() || report.materialized > 0;
        if changed {
            if let Err(err) = storage.save(&document) {
                warn!(error = %err, "failed to persist document after load");
            }
        }
        info!(
            fresh = report.fresh,
            transactions = document.transactions.len(),
            materialized = report.materialized,
            "document ready"
        );

        Ok(Self {
            document: Mutex::new(document),
            storage,
            clock,
            calendar: None,
            rename_policy: RenamePolicy::default(),
            load_report: report,
        })
    }

    pub fn with_calendar(mut self, calendar: Box<dyn CalendarSync>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn with_rename_policy(mut self, policy: RenamePolicy) -> Self {
        self.rename_policy = policy;
        self
    }

    pub fn rename_policy(&self) -> RenamePolicy {
        self.rename_policy
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn snapshot(&self) -> Document {
        self.lock().clone()
    }

    /// Runs a read-only closure against the live document.
    pub fn read<R>(&self, reader: impl FnOnce(&Document) -> R) -> R {
        let guard = self.lock();
        reader(&guard)
    }

    pub fn aggregate(&self, filter: &AggregateFilter) -> AggregateView {
        self.read(|doc| SummaryService::aggregate(&doc.transactions, &doc.accounts, filter))
    }

    pub fn budget_progress(&self, category: &str, month: u32, year: i32) -> BudgetProgress {
        self.read(|doc| {
            SummaryService::budget_progress(&doc.transactions, &doc.budgets, category, month, year)
        })
    }

    pub fn total_budget_progress(&self, month: u32, year: i32) -> BudgetProgress {
        self.read(|doc| SummaryService::total_budget_progress(&doc.transactions, &doc.budgets, month, year))
    }

    /// Applies `operation` atomically and persists the whole document.
    pub fn commit<T>(
        &self,
        operation: impl FnOnce(&mut Document) -> Result<T, CoreError>,
    ) -> Result<Committed<T>, CoreError> {
        let mut guard = self.lock();
        let mut working = guard.clone();
        let value = operation(&mut working)?;
        *guard = working;
        let persist_error = self.persist(&guard);
        Ok(Committed::new(value, persist_error))
    }

    pub fn save_transaction(
        &self,
        draft: &TransactionDraft,
        editing: Option<&str>,
    ) -> Result<Committed<Vec<String>>, CoreError> {
        let mut committed = self.commit(|doc| TransactionService::save(doc, draft, editing))?;
        committed.sync = self.sync_transactions(&committed.value);
        Ok(committed)
    }

    pub fn delete_transaction(&self, id: &str) -> Result<Committed<Transaction>, CoreError> {
        let mut committed = self.commit(|doc| TransactionService::delete(doc, id))?;
        let events = committed.value.calendar_event_id.iter().cloned().collect();
        committed.sync = self.delete_events(events);
        Ok(committed)
    }

    pub fn save_account(
        &self,
        draft: &AccountDraft,
        editing: Option<&str>,
    ) -> Result<Committed<String>, CoreError> {
        self.commit(|doc| AccountService::save(doc, draft, editing))
    }

    pub fn delete_account(&self, id: &str) -> Result<Committed<AccountRemoval>, CoreError> {
        let mut committed = self.commit(|doc| AccountService::delete(doc, id))?;
        committed.sync = self.delete_events(committed.value.calendar_event_ids());
        Ok(committed)
    }

    pub fn create_category(&self, name: &str) -> Result<Committed<()>, CoreError> {
        self.commit(|doc| CategoryService::create(doc, name))
    }

    pub fn rename_category(&self, current: &str, new_name: &str) -> Result<Committed<()>, CoreError> {
        let policy = self.rename_policy;
        self.commit(|doc| CategoryService::rename(doc, current, new_name, policy))
    }

    pub fn delete_category(&self, name: &str) -> Result<Committed<Category>, CoreError> {
        self.commit(|doc| CategoryService::delete(doc, name))
    }

    pub fn create_subcategory(&self, category: &str, name: &str) -> Result<Committed<()>, CoreError> {
        self.commit(|doc| CategoryService::create_subcategory(doc, category, name))
    }

    pub fn rename_subcategory(
        &self,
        category: &str,
        current: &str,
        new_name: &str,
    ) -> Result<Committed<()>, CoreError> {
        self.commit(|doc| CategoryService::rename_subcategory(doc, category, current, new_name))
    }

    pub fn delete_subcategory(&self, category: &str, name: &str) -> Result<Committed<()>, CoreError> {
        self.commit(|doc| CategoryService::delete_subcategory(doc, category, name))
    }

    pub fn save_budgets(
        &self,
        total: f64,
        per_category: BTreeMap<String, f64>,
    ) -> Result<Committed<()>, CoreError> {
        self.commit(|doc| BudgetService::save(doc, total, per_category))
    }

    /// Stores a new series and materializes whatever is already due, in one commit.
    /// Returns the template id and the number of occurrences written.
    pub fn create_recurring(&self, draft: &RecurringDraft) -> Result<Committed<(String, usize)>, CoreError> {
        let now = self.clock.now();
        let mut committed = self.commit(|doc| {
            let id = RecurrenceService::create(doc, draft)?;
            let materialized = RecurrenceService::materialize_due(doc, now)?;
            Ok((id, materialized))
        })?;
        let template_id = committed.value.0.clone();
        let generated: Vec<String> = self.read(|doc| {
            doc.transactions
                .iter()
                .filter(|txn| txn.recurring_template_id.as_deref() == Some(template_id.as_str()))
                .map(|txn| txn.id.clone())
                .collect()
        });
        committed.sync = self.sync_transactions(&generated);
        Ok(committed)
    }

    pub fn delete_recurring(&self, id: &str) -> Result<Committed<RecurringTemplate>, CoreError> {
        self.commit(|doc| RecurrenceService::delete(doc, id))
    }

    /// Materializes occurrences that became due since the document was opened.
    pub fn materialize_due(&self) -> Result<Committed<usize>, CoreError> {
        let now = self.clock.now();
        self.commit(|doc| RecurrenceService::materialize_due(doc, now))
    }

    pub fn set_calendar_sync(&self, enabled: bool) -> Result<Committed<()>, CoreError> {
        self.commit(|doc| {
            DocumentService::set_calendar_sync(doc, enabled);
            Ok(())
        })
    }

    pub fn reset(&self) -> Result<Committed<()>, CoreError> {
        self.commit(|doc| {
            DocumentService::reset(doc);
            Ok(())
        })
    }

    /// Uploads the serialized document to a remote backup target.
    pub fn upload_backup(&self, target: &dyn BackupTarget) -> Result<usize, CoreError> {
        let blob = self.read(DocumentService::to_blob)?;
        target.upload(&blob)?;
        info!(bytes = blob.len(), "document uploaded to backup target");
        Ok(blob.len())
    }

    /// Replaces the local document with the one held by `target`.
    pub fn restore_from(&self, target: &dyn BackupTarget) -> Result<Committed<LoadReport>, CoreError> {
        let blob = target
            .download()?
            .ok_or_else(|| CoreError::InvalidOperation("no remote backup available".into()))?;
        self.restore_blob(&blob)
    }

    pub fn restore_blob(&self, blob: &[u8]) -> Result<Committed<LoadReport>, CoreError> {
        let snapshot = DocumentService::from_blob(blob)?;
        self.replace_with(snapshot)
    }

    pub fn backup_local(&self, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        let guard = self.lock();
        self.storage.backup(&guard, note)
    }

    pub fn list_local_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        self.storage.list_backups()
    }

    pub fn delete_local_backup(&self, backup: &BackupInfo) -> Result<(), CoreError> {
        self.storage.delete_backup(backup)?;
        info!(backup = %backup.id, "local backup deleted");
        Ok(())
    }

    pub fn restore_local(&self, backup: &BackupInfo) -> Result<Committed<LoadReport>, CoreError> {
        let snapshot = self.storage.restore_backup(backup)?;
        self.replace_with(snapshot)
    }

    fn replace_with(&self, snapshot: DocumentSnapshot) -> Result<Committed<LoadReport>, CoreError> {
        let hydrated = DocumentService::hydrate(snapshot)?;
        let report = LoadReport {
            fresh: false,
            migrations: hydrated.migrations,
            warnings: hydrated.warnings,
            materialized: 0,
        };
        let document = hydrated.document;
        self.commit(move |doc| {
            *doc = document;
            Ok(report)
        })
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, document: &Document) -> Option<String> {
        match self.storage.save(document) {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "failed to persist document; change kept in memory");
                Some(err.to_string())
            }
        }
    }

    fn calendar_target(&self) -> Option<&dyn CalendarSync> {
        let enabled = self.read(|doc| doc.calendar_sync_enabled);
        if enabled {
            self.calendar.as_deref()
        } else {
            None
        }
    }

    /// Sends the given transactions to the calendar and records returned event ids.
    fn sync_transactions(&self, ids: &[String]) -> Vec<SyncOutcome> {
        let Some(calendar) = self.calendar_target() else {
            return Vec::new();
        };
        let pending: Vec<Transaction> = self.read(|doc| {
            ids.iter()
                .filter_map(|id| doc.transaction(id).cloned())
                .collect()
        });

        let mut outcomes = Vec::with_capacity(pending.len());
        let mut linked = Vec::new();
        for txn in &pending {
            match calendar.sync_event(txn) {
                Ok(event_id) => {
                    if txn.calendar_event_id.as_deref() != Some(event_id.as_str()) {
                        linked.push((txn.id.clone(), event_id.clone()));
                    }
                    outcomes.push(SyncOutcome::Synced {
                        transaction_id: txn.id.clone(),
                        event_id,
                    });
                }
                Err(reason) => {
                    warn!(transaction = %txn.id, error = %reason, "calendar sync failed");
                    outcomes.push(SyncOutcome::Failed {
                        transaction_id: Some(txn.id.clone()),
                        reason,
                    });
                }
            }
        }

        if !linked.is_empty() {
            let written = self.commit(|doc| {
                for (txn_id, event_id) in linked {
                    // The transaction may have been deleted while the calendar call was in flight.
                    if doc.transaction(&txn_id).is_some() {
                        TransactionService::set_calendar_event(doc, &txn_id, Some(event_id))?;
                    }
                }
                Ok(())
            });
            if let Err(err) = written {
                warn!(error = %err, "failed to record calendar event ids");
            }
        }
        outcomes
    }

    fn delete_events(&self, event_ids: Vec<String>) -> Vec<SyncOutcome> {
        let Some(calendar) = self.calendar_target() else {
            return Vec::new();
        };
        event_ids
            .into_iter()
            .map(|event_id| match calendar.delete_event(&event_id) {
                Ok(()) => SyncOutcome::Deleted { event_id },
                Err(reason) => {
                    warn!(event = %event_id, error = %reason, "calendar event deletion failed");
                    SyncOutcome::Failed {
                        transaction_id: None,
                        reason,
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};
    use spese_domain::{Frequency, CASH_ACCOUNT_ID, WITHDRAWAL_CATEGORY};

    use crate::time::FixedClock;
    use crate::SyncError;

    #[derive(Default)]
    struct MemoryStorage {
        stored: Mutex<Option<DocumentSnapshot>>,
        saves: Mutex<usize>,
        fail_saves: bool,
    }

    impl MemoryStorage {
        fn failing() -> Self {
            Self {
                fail_saves: true,
                ..Self::default()
            }
        }

        fn save_count(&self) -> usize {
            *self.saves.lock().unwrap()
        }

        fn stored(&self) -> Option<DocumentSnapshot> {
            self.stored.lock().unwrap().clone()
        }
    }

    impl DocumentStorage for Arc<MemoryStorage> {
        fn load(&self) -> Result<Option<DocumentSnapshot>, CoreError> {
            Ok(self.stored())
        }

        fn save(&self, document: &Document) -> Result<(), CoreError> {
            if self.fail_saves {
                return Err(CoreError::Storage("disk full".into()));
            }
            *self.saves.lock().unwrap() += 1;
            *self.stored.lock().unwrap() = Some(DocumentSnapshot::from(document.clone()));
            Ok(())
        }

        fn backup(&self, _document: &Document, _note: Option<&str>) -> Result<BackupInfo, CoreError> {
            Err(CoreError::InvalidOperation("not supported".into()))
        }

        fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
            Ok(Vec::new())
        }

        fn restore_backup(&self, _backup: &BackupInfo) -> Result<DocumentSnapshot, CoreError> {
            Err(CoreError::InvalidOperation("not supported".into()))
        }

        fn delete_backup(&self, _backup: &BackupInfo) -> Result<(), CoreError> {
            Err(CoreError::InvalidOperation("not supported".into()))
        }
    }

    #[derive(Default)]
    struct RecordingCalendar {
        sent: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
        offline: bool,
    }

    impl CalendarSync for Arc<RecordingCalendar> {
        fn sync_event(&self, transaction: &Transaction) -> Result<String, SyncError> {
            if self.offline {
                return Err(SyncError::Timeout);
            }
            self.sent.lock().unwrap().push(transaction.id.clone());
            Ok(format!("evt-{}", transaction.id))
        }

        fn delete_event(&self, event_id: &str) -> Result<(), SyncError> {
            self.deleted.lock().unwrap().push(event_id.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryTarget {
        blob: Mutex<Option<Vec<u8>>>,
    }

    impl BackupTarget for MemoryTarget {
        fn upload(&self, blob: &[u8]) -> Result<(), SyncError> {
            *self.blob.lock().unwrap() = Some(blob.to_vec());
            Ok(())
        }

        fn download(&self) -> Result<Option<Vec<u8>>, SyncError> {
            Ok(self.blob.lock().unwrap().clone())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn open(storage: &Arc<MemoryStorage>) -> DocumentManager {
        DocumentManager::open(Box::new(Arc::clone(storage)), Box::new(FixedClock(now())))
            .expect("open manager")
    }

    fn lunch() -> TransactionDraft {
        TransactionDraft::expense(14.0, "Pranzo", "Cibo", CASH_ACCOUNT_ID, now())
    }

    #[test]
    fn open_fresh_persists_default_document() {
        let storage = Arc::new(MemoryStorage::default());
        let manager = open(&storage);

        assert!(manager.load_report().fresh);
        assert_eq!(storage.save_count(), 1);
        assert_eq!(manager.snapshot(), Document::new());
    }

    #[test]
    fn reopening_an_unchanged_document_does_not_save() {
        let storage = Arc::new(MemoryStorage::default());
        open(&storage).save_transaction(&lunch(), None).unwrap();
        let saves = storage.save_count();

        let reopened = open(&storage);
        assert!(!reopened.load_report().fresh);
        assert_eq!(reopened.load_report().materialized, 0);
        assert_eq!(storage.save_count(), saves);
    }

    #[test]
    fn open_materializes_due_recurring_occurrences_once() {
        let storage = Arc::new(MemoryStorage::default());
        {
            let manager = open(&storage);
            let start = Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap();
            let draft = RecurringDraft::new(
                TransactionDraft::expense(700.0, "Affitto", "Casa", CASH_ACCOUNT_ID, start),
                Frequency::Monthly,
                1,
                6,
            );
            let created = manager.create_recurring(&draft).unwrap();
            assert_eq!(created.value.1, 0);
        }

        let later = Utc.with_ymd_and_hms(2024, 9, 2, 0, 0, 0).unwrap();
        let manager =
            DocumentManager::open(Box::new(Arc::clone(&storage)), Box::new(FixedClock(later))).unwrap();
        assert_eq!(manager.load_report().materialized, 3);
        assert_eq!(manager.snapshot().transactions.len(), 3);

        let reopened =
            DocumentManager::open(Box::new(Arc::clone(&storage)), Box::new(FixedClock(later))).unwrap();
        assert_eq!(reopened.load_report().materialized, 0);
        assert_eq!(reopened.snapshot().transactions.len(), 3);
    }

    #[test]
    fn failed_validation_leaves_document_and_storage_untouched() {
        let storage = Arc::new(MemoryStorage::default());
        let manager = open(&storage);
        let before = manager.snapshot();

        let draft =
            TransactionDraft::expense(50.0, "Bancomat", WITHDRAWAL_CATEGORY, CASH_ACCOUNT_ID, now());
        manager.save_transaction(&draft, None).expect_err("cash withdrawal");

        assert_eq!(manager.snapshot(), before);
        assert_eq!(storage.save_count(), 1);
    }

    #[test]
    fn persistence_failure_keeps_in_memory_commit() {
        let storage = Arc::new(MemoryStorage::failing());
        let manager = open(&storage);

        let committed = manager.save_transaction(&lunch(), None).expect("commit");
        assert!(!committed.is_durable());
        assert_eq!(committed.persist_error.as_deref(), Some("Storage error: disk full"));
        assert_eq!(manager.snapshot().transactions.len(), 1);
    }

    #[test]
    fn calendar_ids_are_recorded_after_commit() {
        let storage = Arc::new(MemoryStorage::default());
        let calendar = Arc::new(RecordingCalendar::default());
        let manager = open(&storage).with_calendar(Box::new(Arc::clone(&calendar)));
        manager.set_calendar_sync(true).unwrap();

        let committed = manager.save_transaction(&lunch(), None).unwrap();
        let id = committed.value[0].clone();
        assert_eq!(
            committed.sync,
            vec![SyncOutcome::Synced {
                transaction_id: id.clone(),
                event_id: format!("evt-{id}"),
            }]
        );
        let event_id = format!("evt-{id}");
        let stored = storage.stored().unwrap();
        assert_eq!(
            stored.transactions[0].calendar_event_id.as_deref(),
            Some(event_id.as_str())
        );

        let removed = manager.delete_transaction(&id).unwrap();
        assert_eq!(removed.sync, vec![SyncOutcome::Deleted { event_id: event_id.clone() }]);
        assert_eq!(*calendar.deleted.lock().unwrap(), vec![event_id]);
    }

    #[test]
    fn calendar_failure_does_not_roll_back() {
        let storage = Arc::new(MemoryStorage::default());
        let calendar = Arc::new(RecordingCalendar {
            offline: true,
            ..RecordingCalendar::default()
        });
        let manager = open(&storage).with_calendar(Box::new(calendar));
        manager.set_calendar_sync(true).unwrap();

        let committed = manager.save_transaction(&lunch(), None).unwrap();
        assert_eq!(committed.sync_failures().count(), 1);
        let doc = manager.snapshot();
        assert_eq!(doc.transactions.len(), 1);
        assert!(doc.transactions[0].calendar_event_id.is_none());
    }

    #[test]
    fn calendar_is_skipped_when_sync_disabled() {
        let storage = Arc::new(MemoryStorage::default());
        let calendar = Arc::new(RecordingCalendar::default());
        let manager = open(&storage).with_calendar(Box::new(Arc::clone(&calendar)));

        let committed = manager.save_transaction(&lunch(), None).unwrap();
        assert!(committed.sync.is_empty());
        assert!(calendar.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn remote_backup_restore_replaces_document() {
        let storage = Arc::new(MemoryStorage::default());
        let manager = open(&storage);
        let target = MemoryTarget::default();

        let err = manager.restore_from(&target).expect_err("nothing uploaded");
        assert!(matches!(err, CoreError::InvalidOperation(_)));

        manager.save_transaction(&lunch(), None).unwrap();
        manager.upload_backup(&target).unwrap();
        manager.reset().unwrap();
        assert!(manager.snapshot().transactions.is_empty());

        let restored = manager.restore_from(&target).unwrap();
        assert!(restored.value.warnings.is_empty());
        assert_eq!(manager.snapshot().transactions.len(), 1);
        assert_eq!(storage.stored().unwrap().transactions.len(), 1);
    }

    #[test]
    fn restore_blob_reinjects_cash_and_migrates_categories() {
        let storage = Arc::new(MemoryStorage::default());
        let manager = open(&storage);
        let blob = br#"{"transactions":[],"accounts":[],"categories":["Cibo"]}"#;

        let restored = manager.restore_blob(blob).unwrap();
        let doc = manager.snapshot();
        assert!(doc.has_cash_account());
        assert_eq!(doc.categories[0].name, "Cibo");
        assert!(doc.category("Altro").is_some());
        assert!(!restored.value.migrations.is_empty());
    }

    #[test]
    fn rename_policy_is_applied() {
        let storage = Arc::new(MemoryStorage::default());
        let manager = open(&storage).with_rename_policy(RenamePolicy::KeepSubcategories);
        manager.create_subcategory("Cibo", "Bar").unwrap();
        let ids = manager
            .save_transaction(&lunch().with_subcategory("Bar"), None)
            .unwrap()
            .value;

        manager.rename_category("Cibo", "Alimentari").unwrap();
        let doc = manager.snapshot();
        let txn = doc.transaction(&ids[0]).unwrap();
        assert_eq!(txn.category, "Alimentari");
        assert_eq!(txn.subcategory, "Bar");
    }
}
