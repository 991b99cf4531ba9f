//! Contracts for the external collaborators: calendar mirroring and cloud backup.

use spese_domain::Transaction;

use crate::SyncError;

/// Mirrors transactions as calendar events.
pub trait CalendarSync: Send + Sync {
    /// Creates the event, or replaces it when `transaction.calendar_event_id` is set.
    /// Returns the event identifier to store on the transaction.
    fn sync_event(&self, transaction: &Transaction) -> Result<String, SyncError>;
    fn delete_event(&self, event_id: &str) -> Result<(), SyncError>;
}

/// Remote store receiving the serialized document as an opaque blob.
pub trait BackupTarget: Send + Sync {
    fn upload(&self, blob: &[u8]) -> Result<(), SyncError>;
    /// Returns `Ok(None)` when no backup has been uploaded yet.
    fn download(&self) -> Result<Option<Vec<u8>>, SyncError>;
}

/// Result of one calendar correlation step, reported after the local commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced {
        transaction_id: String,
        event_id: String,
    },
    Deleted {
        event_id: String,
    },
    Failed {
        transaction_id: Option<String>,
        reason: SyncError,
    },
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed { .. })
    }
}
