use std::path::PathBuf;

use spese_domain::{Document, DocumentSnapshot};

use crate::CoreError;

/// Describes a persisted backup artifact of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: String,
    /// User note the backup was written with. `None` for automatic backups.
    pub note: Option<String>,
    pub path: PathBuf,
}

impl BackupInfo {
    /// Automatic backups are written before every save and pruned to the
    /// retention limit. Noted backups are only removed on request.
    pub fn is_automatic(&self) -> bool {
        self.note.is_none()
    }
}

/// Abstraction over persistence backends holding the single ledger document.
///
/// Saves replace the whole document; there is no partial-field merge.
pub trait DocumentStorage: Send + Sync {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<DocumentSnapshot>, CoreError>;
    fn save(&self, document: &Document) -> Result<(), CoreError>;
    fn backup(&self, document: &Document, note: Option<&str>) -> Result<BackupInfo, CoreError>;
    fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError>;
    fn restore_backup(&self, backup: &BackupInfo) -> Result<DocumentSnapshot, CoreError>;
    fn delete_backup(&self, backup: &BackupInfo) -> Result<(), CoreError>;
}
