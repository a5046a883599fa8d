//! File-backed record store.
//!
//! # Storage layout
//!
//! ```text
//! ~/.placesync/
//!   records.json      (mode 0600)
//! ```
//!
//! Mutations are held in memory until [`RecordStore::flush`], which writes
//! `records.json.tmp` and renames it over `records.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError};
use crate::store::{RecordStore, RecordTable};
use crate::types::{LanguageCode, LocalRecord, MetaValue, RecordId};

const STORE_VERSION: u32 = 1;

/// On-disk store payload.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    next_id: u64,
    #[serde(default)]
    records: Vec<LocalRecord>,
}

/// `<home>/.placesync/records.json`. Pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".placesync").join("records.json")
}

/// Record store persisted as one JSON document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    table: RecordTable,
    dirty: bool,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// Returns an empty store if the file does not yet exist; nothing is
    /// written until the first flush.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                table: RecordTable::default(),
                dirty: false,
            });
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let file: StoreFile = serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
            path: path.clone(),
            source: e,
        })?;

        let max_id = file.records.iter().map(|r| r.id.0).max().unwrap_or(0);
        let table = RecordTable {
            next_id: file.next_id.max(max_id),
            records: file.records.into_iter().map(|r| (r.id, r)).collect(),
        };
        tracing::debug!(
            "opened store {} ({} records)",
            path.display(),
            table.records.len()
        );
        Ok(Self {
            path,
            table,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record regardless of language, ordered by id.
    pub fn records(&self) -> impl Iterator<Item = &LocalRecord> {
        self.table.records.values()
    }

    fn save(&self) -> Result<(), StoreError> {
        let Some(dir) = self.path.parent() else {
            return Err(io_err(
                &self.path,
                std::io::Error::other("invalid store path"),
            ));
        };
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        let file = StoreFile {
            version: STORE_VERSION,
            next_id: self.table.next_id,
            records: self.table.records.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        set_file_permissions(&tmp)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&self.path, e));
        }
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn query(&self, language: &LanguageCode) -> Result<Vec<LocalRecord>, StoreError> {
        Ok(self.table.query(language))
    }

    fn create(&mut self, title: &str, language: &LanguageCode) -> Result<RecordId, StoreError> {
        let id = self.table.create(title, language);
        self.dirty = true;
        Ok(id)
    }

    fn update_title(&mut self, id: RecordId, title: &str) -> Result<bool, StoreError> {
        let changed = self.table.get_mut(id)?.set_title(title);
        self.dirty |= changed;
        Ok(changed)
    }

    fn delete(&mut self, id: RecordId) -> Result<(), StoreError> {
        self.table.delete(id)?;
        self.dirty = true;
        Ok(())
    }

    fn get_meta(&self, id: RecordId, key: &str) -> Result<Option<MetaValue>, StoreError> {
        Ok(self.table.get(id)?.meta.get(key).cloned())
    }

    fn set_meta(
        &mut self,
        id: RecordId,
        key: &str,
        value: MetaValue,
    ) -> Result<bool, StoreError> {
        let changed = self.table.get_mut(id)?.set_meta(key, value)?;
        self.dirty |= changed;
        Ok(changed)
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        self.save()?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
