//! File-backed storage: one JSON document mapping "Kind.id" to record dicts
//!
//! The whole document is held in memory and rewritten on every `save`.
//! Deletes do NOT cascade: removing a State leaves its Cities behind.

use super::Storage;
use crate::entities::{self, Kind, Record};
use crate::error::Result;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct FileStorage {
    path: PathBuf,
    objects: BTreeMap<String, Record>,
}

impl FileStorage {
    /// Open the document at `path`. A missing file means an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut storage = FileStorage {
            path: path.into(),
            objects: BTreeMap::new(),
        };
        storage.reload()?;
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn get(&self, kind: Kind, id: &str) -> Result<Option<Record>> {
        if id.is_empty() {
            return Ok(None);
        }
        Ok(self.objects.get(&entities::key(kind, id)).cloned())
    }

    fn all(&self, kind: Option<Kind>) -> Result<BTreeMap<String, Record>> {
        Ok(self
            .objects
            .iter()
            .filter(|(_, record)| kind.map_or(true, |k| record.kind() == k))
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect())
    }

    fn new(&mut self, record: Record) -> Result<()> {
        self.objects.entry(record.key()).or_insert(record);
        Ok(())
    }

    fn update(&mut self, record: Record) -> Result<bool> {
        match self.objects.get_mut(&record.key()) {
            Some(slot) => {
                *slot = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Written to a sibling temp file and renamed over the document, so a
    /// failed save leaves the previous document intact.
    fn save(&mut self) -> Result<()> {
        let document = serde_json::to_vec(&self.objects)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(&document)?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(
            path = %self.path.display(),
            records = self.objects.len(),
            "file storage saved"
        );
        Ok(())
    }

    fn delete(&mut self, record: &Record) -> Result<()> {
        self.objects.remove(&record.key());
        Ok(())
    }

    fn count(&self, kind: Option<Kind>) -> Result<usize> {
        Ok(match kind {
            Some(k) => self.objects.values().filter(|r| r.kind() == k).count(),
            None => self.objects.len(),
        })
    }

    fn reload(&mut self) -> Result<()> {
        if !self.path.exists() {
            self.objects.clear();
            return Ok(());
        }

        let raw = fs::read(&self.path)?;
        let document: BTreeMap<String, Record> = if raw.iter().all(u8::is_ascii_whitespace) {
            BTreeMap::new()
        } else {
            serde_json::from_slice(&raw)?
        };

        // Keys are rebuilt from the records so a hand-edited key cannot
        // disagree with the record it points to.
        self.objects = document
            .into_values()
            .map(|record| (record.key(), record))
            .collect();

        tracing::debug!(
            path = %self.path.display(),
            records = self.objects.len(),
            "file storage loaded"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.reload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{City, Entity, State};
    use crate::storage::contract;
    use tempfile::TempDir;

    fn temp_storage() -> (TempDir, FileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("file.json")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_contract() {
        let checks: [fn(&mut dyn Storage); 9] = [
            contract::get_after_save_returns_equal_record,
            contract::get_missing_or_malformed_is_none,
            contract::delete_then_get_is_none,
            contract::count_matches_all,
            contract::new_is_noop_on_existing_identity,
            contract::save_record_updates_and_bumps_timestamp,
            contract::update_missing_returns_false,
            contract::close_discards_unsaved_records,
            contract::amenity_link_order_survives_save,
        ];
        for check in checks {
            let (_dir, mut storage) = temp_storage();
            check(&mut storage);
        }
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let (_dir, storage) = temp_storage();
        assert_eq!(storage.count(None).unwrap(), 0);
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_document_layout() {
        let (_dir, mut storage) = temp_storage();
        let state = State::new("Cairo");
        storage.new(state.clone().into()).unwrap();
        storage.save().unwrap();

        let raw = fs::read_to_string(storage.path()).unwrap();
        let document: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &document[format!("State.{}", state.id())];

        assert_eq!(entry["__class__"], "State");
        assert_eq!(entry["name"], "Cairo");
        assert_eq!(entry["id"], state.id());
        assert!(entry["created_at"].is_string());
    }

    #[test]
    fn test_records_survive_reopen() {
        let (dir, mut storage) = temp_storage();
        let state = State::new("Cairo");
        let city = City::new("Giza", state.id());
        storage.new(state.clone().into()).unwrap();
        storage.new(city.clone().into()).unwrap();
        storage.save().unwrap();

        let reopened = FileStorage::open(dir.path().join("file.json")).unwrap();
        assert_eq!(reopened.count(None).unwrap(), 2);
        assert_eq!(
            reopened.get(Kind::City, city.id()).unwrap(),
            Some(Record::City(city))
        );
    }

    #[test]
    fn test_delete_does_not_cascade() {
        let (_dir, mut storage) = temp_storage();
        let state = State::new("Cairo");
        let city = City::new("Giza", state.id());
        let state_record: Record = state.into();
        storage.new(state_record.clone()).unwrap();
        storage.new(city.clone().into()).unwrap();
        storage.save().unwrap();

        storage.delete(&state_record).unwrap();
        storage.save().unwrap();

        assert!(storage.get(Kind::State, state_record.id()).unwrap().is_none());
        assert!(storage.get(Kind::City, city.id()).unwrap().is_some());
    }

    #[test]
    fn test_save_replaces_document_without_leftovers() {
        let (dir, mut storage) = temp_storage();
        storage.new(State::new("Cairo").into()).unwrap();
        storage.save().unwrap();
        storage.new(State::new("Giza").into()).unwrap();
        storage.save().unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("file.json")]);

        let reopened = FileStorage::open(storage.path()).unwrap();
        assert_eq!(reopened.count(Some(Kind::State)).unwrap(), 2);
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        fs::write(&path, "{not json").unwrap();

        assert!(FileStorage::open(&path).is_err());
    }
}
