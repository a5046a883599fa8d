//! Local record store collaborator.
//!
//! The sync engine only talks to [`RecordStore`]; [`MemoryStore`] keeps
//! everything in process and [`crate::json_store::JsonFileStore`] persists to
//! a single JSON document.

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::types::{LanguageCode, LocalRecord, MetaValue, RecordId};

/// Create/read/update/delete access to place-of-business records.
pub trait RecordStore {
    /// All records tagged with `language`, ordered by id.
    fn query(&self, language: &LanguageCode) -> Result<Vec<LocalRecord>, StoreError>;

    /// Create a new record and return its id.
    fn create(&mut self, title: &str, language: &LanguageCode) -> Result<RecordId, StoreError>;

    /// Replace a record's title. Returns `true` if the value changed.
    fn update_title(&mut self, id: RecordId, title: &str) -> Result<bool, StoreError>;

    /// Permanently remove a record.
    fn delete(&mut self, id: RecordId) -> Result<(), StoreError>;

    fn get_meta(&self, id: RecordId, key: &str) -> Result<Option<MetaValue>, StoreError>;

    /// Write one metadata field. Returns `true` if the value changed.
    fn set_meta(&mut self, id: RecordId, key: &str, value: MetaValue)
        -> Result<bool, StoreError>;

    /// Persist pending writes. In-memory stores have nothing to do.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Shared record table used by both store implementations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RecordTable {
    pub next_id: u64,
    pub records: BTreeMap<RecordId, LocalRecord>,
}

impl RecordTable {
    pub fn query(&self, language: &LanguageCode) -> Vec<LocalRecord> {
        self.records
            .values()
            .filter(|r| &r.language == language)
            .cloned()
            .collect()
    }

    pub fn create(&mut self, title: &str, language: &LanguageCode) -> RecordId {
        self.next_id += 1;
        let id = RecordId(self.next_id);
        self.records
            .insert(id, LocalRecord::new(id, title, language.clone()));
        id
    }

    pub fn get(&self, id: RecordId) -> Result<&LocalRecord, StoreError> {
        self.records.get(&id).ok_or(StoreError::RecordNotFound { id })
    }

    pub fn get_mut(&mut self, id: RecordId) -> Result<&mut LocalRecord, StoreError> {
        self.records
            .get_mut(&id)
            .ok_or(StoreError::RecordNotFound { id })
    }

    pub fn delete(&mut self, id: RecordId) -> Result<(), StoreError> {
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::RecordNotFound { id })
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store with no persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    table: RecordTable,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record regardless of language.
    pub fn records(&self) -> impl Iterator<Item = &LocalRecord> {
        self.table.records.values()
    }

    pub fn get(&self, id: RecordId) -> Option<&LocalRecord> {
        self.table.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.table.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn query(&self, language: &LanguageCode) -> Result<Vec<LocalRecord>, StoreError> {
        Ok(self.table.query(language))
    }

    fn create(&mut self, title: &str, language: &LanguageCode) -> Result<RecordId, StoreError> {
        Ok(self.table.create(title, language))
    }

    fn update_title(&mut self, id: RecordId, title: &str) -> Result<bool, StoreError> {
        Ok(self.table.get_mut(id)?.set_title(title))
    }

    fn delete(&mut self, id: RecordId) -> Result<(), StoreError> {
        self.table.delete(id)
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
        self.table.get_mut(id)?.set_meta(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ENTITY_API_ID;

    fn fi() -> LanguageCode {
        LanguageCode::from("fi")
    }

    #[test]
    fn create_assigns_increasing_ids() {
        let mut store = MemoryStore::new();
        let a = store.create("A", &fi()).unwrap();
        let b = store.create("B", &fi()).unwrap();
        assert!(b > a);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn query_filters_by_language() {
        let mut store = MemoryStore::new();
        store.create("A", &fi()).unwrap();
        store.create("B", &LanguageCode::from("en")).unwrap();
        let fi_records = store.query(&fi()).unwrap();
        assert_eq!(fi_records.len(), 1);
        assert_eq!(fi_records[0].title, "A");
    }

    #[test]
    fn meta_roundtrip_and_delete() {
        let mut store = MemoryStore::new();
        let id = store.create("A", &fi()).unwrap();
        store.set_meta(id, ENTITY_API_ID, "1-fi".into()).unwrap();
        assert_eq!(
            store.get_meta(id, ENTITY_API_ID).unwrap(),
            Some(MetaValue::from("1-fi"))
        );

        store.delete(id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.get_meta(id, ENTITY_API_ID),
            Err(StoreError::RecordNotFound { .. })
        ));
    }

    #[test]
    fn update_title_unknown_record_fails() {
        let mut store = MemoryStore::new();
        let err = store.update_title(RecordId(99), "x").unwrap_err();
        assert!(err.to_string().contains("99"));
    }
}
