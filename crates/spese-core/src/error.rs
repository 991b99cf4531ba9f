use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Subcategory not found: {0}")]
    SubcategoryNotFound(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Recurring template not found: {0}")]
    TemplateNotFound(String),
    #[error("Reserved account cannot be modified: {0}")]
    ReservedAccount(String),
    #[error("Reserved category cannot be modified: {0}")]
    ReservedCategory(String),
    #[error("Already exists: {0}")]
    Duplicate(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Integrity violation: {0}")]
    Integrity(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serde(err.to_string())
    }
}

/// Failure reported by an external collaborator (calendar, cloud backup).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("authorization expired or missing")]
    Unauthorized,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("request timed out")]
    Timeout,
}
