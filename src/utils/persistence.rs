use std::path::{Path, PathBuf};

use tracing::{info, warn};

use spese_config::{Config, ConfigManager};
use spese_core::{BackupTarget, Clock, DocumentManager, RenamePolicy, SyncError};
use spese_storage_json::{JsonDocumentStorage, StoragePaths};

use crate::errors::AppError;
use crate::utils::clock::SystemClock;

/// Overrides the application home directory.
pub const HOME_ENV: &str = "SPESE_HOME";

/// Resolves the application home: `SPESE_HOME`, else `~/.spese`.
pub fn resolve_home() -> PathBuf {
    match std::env::var_os(HOME_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => Config::default_home(),
    }
}

/// Everything the front end needs once the home directory is known.
pub struct Workspace {
    pub home: PathBuf,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub documents: DocumentManager,
}

impl Workspace {
    /// Opens the workspace under `home` using the wall clock.
    pub fn open(home: &Path) -> Result<Self, AppError> {
        Self::open_with_clock(home, Box::new(SystemClock))
    }

    pub fn open_with_clock(home: &Path, clock: Box<dyn Clock>) -> Result<Self, AppError> {
        let config_manager = ConfigManager::with_base_dir(home.to_path_buf())?;
        let config = config_manager.load()?;
        let storage = open_storage(&config, home)?;
        let documents = DocumentManager::open(Box::new(storage), clock)?
            .with_rename_policy(RenamePolicy::from_clear_flag(
                config.clear_subcategories_on_rename,
            ));

        let report = documents.load_report();
        for migration in &report.migrations {
            info!(%migration, "document migrated");
        }
        for warning in &report.warnings {
            warn!(%warning, "document integrity warning");
        }

        Ok(Self {
            home: home.to_path_buf(),
            config_manager,
            config,
            documents,
        })
    }

    pub fn save_config(&self) -> Result<(), AppError> {
        self.config_manager.save(&self.config)?;
        Ok(())
    }
}

/// Builds the JSON storage collaborator from the configured roots and retention.
pub fn open_storage(config: &Config, home: &Path) -> Result<JsonDocumentStorage, AppError> {
    let paths = StoragePaths {
        data_root: config.resolve_data_root(home),
        backup_root: config.resolve_backup_root(home),
    };
    Ok(JsonDocumentStorage::with_retention(
        paths,
        config.effective_retention(),
    )?)
}

/// Backup target holding the serialized document in a single file.
#[derive(Debug, Clone)]
pub struct FileBackupTarget {
    path: PathBuf,
}

impl FileBackupTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackupTarget for FileBackupTarget {
    fn upload(&self, blob: &[u8]) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| SyncError::Unavailable(err.to_string()))?;
        }
        std::fs::write(&self.path, blob).map_err(|err| SyncError::Rejected(err.to_string()))
    }

    fn download(&self) -> Result<Option<Vec<u8>>, SyncError> {
        match std::fs::read(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SyncError::Unavailable(err.to_string())),
        }
    }
}
