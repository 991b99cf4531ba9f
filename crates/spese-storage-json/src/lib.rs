use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use tracing::{debug, warn};

use spese_core::{BackupInfo, CoreError, DocumentStorage};
use spese_domain::{Document, DocumentSnapshot};

/// Storage key of the ledger document; also the stem of every file written.
pub const STORAGE_KEY: &str = "financeData";

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DEFAULT_RETENTION: usize = 5;

/// Directories used by [`JsonDocumentStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
}

/// Filesystem-backed JSON persistence for the single ledger document and its backups.
#[derive(Debug, Clone)]
pub struct JsonDocumentStorage {
    data_root: PathBuf,
    backup_root: PathBuf,
    retention: usize,
}

impl JsonDocumentStorage {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.data_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            data_root: paths.data_root,
            backup_root: paths.backup_root,
            retention: retention.max(1),
        })
    }

    pub fn document_path(&self) -> PathBuf {
        self.data_root.join(format!("{STORAGE_KEY}.json"))
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    fn write_backup(&self, contents: &[u8], note: Option<&str>) -> Result<BackupInfo, CoreError> {
        fs::create_dir_all(&self.backup_root)?;
        let stamp = BackupName::new(Utc::now(), note);
        let (file_name, path) = (1..)
            .map(|attempt| {
                let name = stamp.file_name(attempt);
                let path = self.backup_root.join(&name);
                (name, path)
            })
            .find(|(_, path)| !path.exists())
            .ok_or_else(|| CoreError::Storage("no free backup name".into()))?;
        replace_file(&path, contents)?;
        self.prune_backups()?;
        debug!(backup = %file_name, "document backup written");
        Ok(BackupInfo {
            id: file_name,
            created_at: stamp.created_label(),
            note: stamp.label,
            path,
        })
    }

    fn backup_existing_file(&self) -> Result<(), CoreError> {
        let current = self.document_path();
        match fs::read(&current) {
            Ok(contents) => self.write_backup(&contents, None).map(|_| ()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Drops automatic backups beyond the retention limit. Noted backups stay.
    fn prune_backups(&self) -> Result<(), CoreError> {
        let expired = self
            .list_backups()?
            .into_iter()
            .filter(BackupInfo::is_automatic)
            .skip(self.retention);
        for entry in expired {
            if let Err(err) = fs::remove_file(&entry.path) {
                warn!(backup = %entry.id, error = %err, "failed to prune old backup");
            }
        }
        Ok(())
    }
}

impl DocumentStorage for JsonDocumentStorage {
    fn load(&self) -> Result<Option<DocumentSnapshot>, CoreError> {
        load_snapshot_from_path(&self.document_path())
    }

    fn save(&self, document: &Document) -> Result<(), CoreError> {
        self.backup_existing_file()?;
        save_document_to_path(document, &self.document_path())
    }

    fn backup(&self, document: &Document, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        self.write_backup(&serde_json::to_vec_pretty(document)?, note)
    }

    fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        let dir = match fs::read_dir(&self.backup_root) {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut found: Vec<(BackupName, BackupInfo)> = Vec::new();
        for entry in dir {
            let entry = entry?;
            let id = entry.file_name().to_string_lossy().into_owned();
            if let Some(parsed) = BackupName::parse(&id) {
                let info = BackupInfo {
                    created_at: parsed.created_label(),
                    note: parsed.label.clone(),
                    path: entry.path(),
                    id,
                };
                found.push((parsed, info));
            }
        }
        found.sort_by(|(a, a_info), (b, b_info)| {
            b.created.cmp(&a.created).then_with(|| b_info.id.cmp(&a_info.id))
        });
        Ok(found.into_iter().map(|(_, info)| info).collect())
    }

    fn restore_backup(&self, backup: &BackupInfo) -> Result<DocumentSnapshot, CoreError> {
        let contents = match fs::read(&backup.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(CoreError::Storage(format!("backup `{}` not found", backup.id)));
            }
            Err(err) => return Err(err.into()),
        };
        let snapshot: DocumentSnapshot = serde_json::from_slice(&contents)?;
        self.backup_existing_file()?;
        replace_file(&self.document_path(), &contents)?;
        Ok(snapshot)
    }

    fn delete_backup(&self, backup: &BackupInfo) -> Result<(), CoreError> {
        if !backup.path.starts_with(&self.backup_root) {
            return Err(CoreError::Storage(format!(
                "backup `{}` is outside the backup directory",
                backup.id
            )));
        }
        match fs::remove_file(&backup.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(CoreError::Storage(format!("backup `{}` not found", backup.id)))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Saves a document to an arbitrary path on disk, replacing it atomically.
pub fn save_document_to_path(document: &Document, path: &Path) -> Result<(), CoreError> {
    let bytes = serde_json::to_vec_pretty(document)?;
    replace_file(path, &bytes)
}

/// Loads a stored snapshot, returning `None` when the file does not exist.
pub fn load_snapshot_from_path(path: &Path) -> Result<Option<DocumentSnapshot>, CoreError> {
    match File::open(path) {
        Ok(file) => Ok(Some(serde_json::from_reader(BufReader::new(file))?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// `financeData_<YYYYMMDD>_<HHMMSS>[_<note>][_<n>].json`
///
/// `<n>` only appears when an earlier backup took the same name in the same second.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BackupName {
    created: DateTime<Utc>,
    label: Option<String>,
}

impl BackupName {
    fn new(now: DateTime<Utc>, note: Option<&str>) -> Self {
        let label = note.map(slug).filter(|label| !label.is_empty()).map(|label| {
            // A bare number would read back as a collision counter.
            if label.bytes().all(|byte| byte.is_ascii_digit()) {
                format!("note-{label}")
            } else {
                label
            }
        });
        // Names only carry whole seconds.
        let created = now.with_nanosecond(0).unwrap_or(now);
        Self { created, label }
    }

    fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(".json")?;
        let rest = stem.strip_prefix(STORAGE_KEY)?.strip_prefix('_')?;
        let stamp = rest.get(..15)?;
        if !stamp.bytes().enumerate().all(|(idx, byte)| match idx {
            8 => byte == b'_',
            _ => byte.is_ascii_digit(),
        }) {
            return None;
        }
        let created = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?.and_utc();

        let tail = &rest[15..];
        let segments: Vec<&str> = match tail {
            "" => Vec::new(),
            _ => tail.strip_prefix('_')?.split('_').collect(),
        };
        let is_counter =
            |segment: &str| !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit());
        let label = match segments.as_slice() {
            [] => None,
            [only] if is_counter(*only) => None,
            [label] | [label, _] if !label.is_empty() => Some(label.to_string()),
            _ => return None,
        };
        if let [_, counter] = segments.as_slice() {
            if !is_counter(*counter) {
                return None;
            }
        }
        Some(Self { created, label })
    }

    fn file_name(&self, attempt: u32) -> String {
        let mut name = format!("{STORAGE_KEY}_{}", self.created_label());
        if let Some(label) = &self.label {
            name.push('_');
            name.push_str(label);
        }
        if attempt > 1 {
            name.push_str(&format!("_{attempt}"));
        }
        name.push_str(".json");
        name
    }

    fn created_label(&self) -> String {
        self.created.format(STAMP_FORMAT).to_string()
    }
}

/// Lowercase ASCII words separated by single dashes; other symbols are dropped.
fn slug(note: &str) -> String {
    note.split(|ch: char| ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
        .map(|word| {
            word.chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|ch| ch.to_ascii_lowercase())
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Writes `<path>.tmp` and renames it over `path`.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    {
        let mut writer = BufWriter::new(File::create(&staging)?);
        writer.write_all(bytes)?;
        writer.flush()?;
    }
    fs::rename(&staging, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn notes_become_dashed_slugs() {
        assert_eq!(slug("  Fine Anno 2024! "), "fine-anno-2024");
        assert_eq!(slug("pre_reset.v2"), "pre-reset-v2");
        assert_eq!(slug("***"), "");
    }

    #[test]
    fn backup_names_parse_with_and_without_notes() {
        let plain = BackupName::parse("financeData_20240131_235959.json").expect("plain");
        assert_eq!(plain.created_label(), "20240131_235959");
        assert_eq!(plain.label, None);

        let noted = BackupName::parse("financeData_20240131_235959_pre-reset.json").expect("noted");
        assert_eq!(noted.label.as_deref(), Some("pre-reset"));

        assert!(BackupName::parse("financeData_2024_0101.json").is_none());
        assert!(BackupName::parse("other_20240131_235959.json").is_none());
        assert!(BackupName::parse("financeData_20240131_235959x.json").is_none());
    }

    #[test]
    fn collision_counters_are_not_notes() {
        let automatic = BackupName::parse("financeData_20240131_235959_2.json").expect("counter");
        assert_eq!(automatic.label, None);

        let noted = BackupName::parse("financeData_20240131_235959_fine-mese_3.json").expect("noted");
        assert_eq!(noted.label.as_deref(), Some("fine-mese"));

        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let numeric = BackupName::new(now, Some("2024"));
        assert_eq!(numeric.label.as_deref(), Some("note-2024"));
        let reparsed = BackupName::parse(&numeric.file_name(1)).expect("numeric note");
        assert_eq!(reparsed, numeric);
    }

    #[test]
    fn collisions_get_a_counter() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let name = BackupName::new(now, Some("Fine mese"));
        assert_eq!(name.file_name(1), "financeData_20240501_083000_fine-mese.json");
        assert_eq!(name.file_name(3), "financeData_20240501_083000_fine-mese_3.json");
        assert_eq!(BackupName::new(now, None).file_name(1), "financeData_20240501_083000.json");
    }
}
