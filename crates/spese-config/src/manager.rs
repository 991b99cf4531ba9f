use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{Config, ConfigError};

const CONFIG_FILE: &str = "config.json";
const BACKUP_STAMP: &str = "%Y%m%d_%H%M%S";

/// Reads, writes and snapshots the user's [`Config`].
///
/// Snapshots are plain JSON files named
/// `config_<YYYYMMDD>_<HHMMSS>[_<note>][_<n>].json`.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf, backups_dir: PathBuf) -> Self {
        Self {
            config_path,
            backups_dir,
        }
    }

    /// Uses `<base>/config/config.json` and creates `<base>/config/backups/`.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let root = base.join("config");
        let manager = Self::new(root.join(CONFIG_FILE), root.join("backups"));
        fs::create_dir_all(&manager.backups_dir)?;
        Ok(manager)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Missing file means defaults.
    pub fn load(&self) -> Result<Config, ConfigError> {
        match File::open(&self.config_path) {
            Ok(file) => Ok(serde_json::from_reader(BufReader::new(file))?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes next to the target and renames over it.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let mut staging = self.config_path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        write_config(&staging, config)?;
        fs::rename(&staging, &self.config_path)?;
        Ok(())
    }

    /// Snapshots `config` into the backups directory and returns the file name.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String, ConfigError> {
        fs::create_dir_all(&self.backups_dir)?;
        let label = note.map(slugify).filter(|slug| !slug.is_empty());
        let base = match label {
            Some(label) => format!("config_{}_{label}", Utc::now().format(BACKUP_STAMP)),
            None => format!("config_{}", Utc::now().format(BACKUP_STAMP)),
        };
        let name = (1..)
            .map(|n| match n {
                1 => format!("{base}.json"),
                n => format!("{base}_{n}.json"),
            })
            .find(|candidate| !self.backups_dir.join(candidate).exists())
            .unwrap_or_else(|| format!("{base}.json"));
        write_config(&self.backups_dir.join(&name), config)?;
        Ok(name)
    }

    /// Makes the named snapshot the active configuration.
    pub fn restore(&self, backup_name: &str) -> Result<Config, ConfigError> {
        let file = File::open(self.backups_dir.join(backup_name)).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("configuration backup `{backup_name}` not found"),
                )
            } else {
                err
            }
        })?;
        let config: Config = serde_json::from_reader(BufReader::new(file))?;
        self.save(&config)?;
        Ok(config)
    }

    /// Snapshot file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, ConfigError> {
        let entries = match fs::read_dir(&self.backups_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut stamped = Vec::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                stamped.push((snapshot_time(&name), name));
            }
        }
        stamped.sort_unstable_by(|a, b| b.cmp(a));
        Ok(stamped.into_iter().map(|(_, name)| name).collect())
    }
}

fn write_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, config)?;
    writer.flush()?;
    Ok(())
}

/// Lowercase ASCII words joined by single dashes.
fn slugify(note: &str) -> String {
    note.split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn snapshot_time(name: &str) -> Option<DateTime<Utc>> {
    let rest = name.strip_prefix("config_")?;
    let stamp = rest.get(..15)?;
    NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP)
        .ok()
        .map(|naive| naive.and_utc())
}
