//! Storage layer
//!
//! Two interchangeable backends behind one contract:
//! - `FileStorage`: every record in a single JSON document, no cascades
//! - `DbStorage`: SQLite, deletes cascade through foreign keys
//!
//! A record moves unsaved -> pending (`new`) -> persisted (`save`) -> deleted.
//! Pending work not saved before `close` is discarded.

pub mod db;
pub mod file;

pub use db::DbStorage;
pub use file::FileStorage;

use crate::config::{Config, StorageType};
use crate::entities::{Kind, Record};
use crate::error::Result;
use std::collections::BTreeMap;

pub trait Storage: Send {
    /// The record of `kind` with identity `id`, or None if absent or malformed
    fn get(&self, kind: Kind, id: &str) -> Result<Option<Record>>;

    /// Every tracked record keyed "Kind.id", optionally of a single kind
    fn all(&self, kind: Option<Kind>) -> Result<BTreeMap<String, Record>>;

    /// Register a freshly built record as pending.
    /// No-op when a record with the same key already exists.
    fn new(&mut self, record: Record) -> Result<()>;

    /// Replace the tracked copy of an existing record.
    /// Returns false (and does nothing) when no such record exists.
    fn update(&mut self, record: Record) -> Result<bool>;

    /// Persist all pending, modified and deleted records
    fn save(&mut self) -> Result<()>;

    /// Remove a record. Removing an absent record is not an error.
    fn delete(&mut self, record: &Record) -> Result<()>;

    fn count(&self, kind: Option<Kind>) -> Result<usize> {
        Ok(self.all(kind)?.len())
    }

    /// (Re)load from durable state, dropping anything unsaved
    fn reload(&mut self) -> Result<()>;

    /// End of a request scope
    fn close(&mut self) -> Result<()>;

    /// Bump `updated_at`, track the record (new or existing) and save
    fn save_record(&mut self, record: &mut Record) -> Result<()> {
        record.touch();
        if !self.update(record.clone())? {
            self.new(record.clone())?;
        }
        self.save()
    }
}

/// Open the backend selected by `config`
pub fn open(config: &Config) -> Result<Box<dyn Storage>> {
    match config.storage_type {
        StorageType::File => {
            tracing::info!(path = %config.file_path.display(), "using file storage");
            Ok(Box::new(FileStorage::open(&config.file_path)?))
        }
        StorageType::Db => {
            tracing::info!(path = %config.db_path.display(), "using database storage");
            let mut db = DbStorage::open(&config.db_path)?;
            if config.is_test_env() {
                tracing::warn!("HBNB_ENV=test, dropping all tables");
                db.drop_all()?;
            }
            Ok(Box::new(db))
        }
    }
}

/// Contract checks run against both backends
#[cfg(test)]
pub(crate) mod contract {
    use super::*;
    use crate::entities::{Amenity, City, Entity, Place, State, User};

    pub fn get_after_save_returns_equal_record(store: &mut dyn Storage) {
        let user: Record = User::new("test@123.com", "pswrd").into();
        store.new(user.clone()).unwrap();
        store.save().unwrap();

        let retrieved = store.get(Kind::User, user.id()).unwrap();
        assert_eq!(retrieved, Some(user));
    }

    pub fn get_missing_or_malformed_is_none(store: &mut dyn Storage) {
        assert!(store.get(Kind::User, "nonexistent_id").unwrap().is_none());
        assert!(store.get(Kind::User, "").unwrap().is_none());

        // Right id, wrong kind
        let state: Record = State::new("California").into();
        store.new(state.clone()).unwrap();
        store.save().unwrap();
        assert!(store.get(Kind::City, state.id()).unwrap().is_none());
    }

    pub fn delete_then_get_is_none(store: &mut dyn Storage) {
        let amenity: Record = Amenity::new("Wifi").into();
        store.new(amenity.clone()).unwrap();
        store.save().unwrap();

        store.delete(&amenity).unwrap();
        assert!(store.get(Kind::Amenity, amenity.id()).unwrap().is_none());
        store.save().unwrap();
        assert!(store.get(Kind::Amenity, amenity.id()).unwrap().is_none());

        // Idempotent
        store.delete(&amenity).unwrap();
        store.save().unwrap();
    }

    pub fn count_matches_all(store: &mut dyn Storage) {
        let initial = store.count(None).unwrap();

        let state = State::new("California");
        let city = City::new("San Francisco", state.id());
        store.new(state.into()).unwrap();
        store.new(city.into()).unwrap();
        store.new(Amenity::new("Pool").into()).unwrap();
        store.save().unwrap();

        assert_eq!(store.count(None).unwrap(), initial + 3);
        assert_eq!(store.count(None).unwrap(), store.all(None).unwrap().len());
        for kind in Kind::ALL {
            assert_eq!(
                store.count(Some(kind)).unwrap(),
                store.all(Some(kind)).unwrap().len()
            );
        }
        assert!(store
            .all(Some(Kind::City))
            .unwrap()
            .keys()
            .all(|key| key.starts_with("City.")));
    }

    pub fn new_is_noop_on_existing_identity(store: &mut dyn Storage) {
        let state = State::new("Cairo");
        store.new(state.clone().into()).unwrap();
        store.save().unwrap();

        let mut impostor = state.clone();
        impostor.name = "Giza".to_string();
        store.new(impostor.into()).unwrap();
        store.save().unwrap();

        let stored = store.get(Kind::State, state.id()).unwrap().unwrap();
        assert_eq!(State::try_from(stored).unwrap().name, "Cairo");
    }

    pub fn save_record_updates_and_bumps_timestamp(store: &mut dyn Storage) {
        let state = State::new("Cairo");
        store.new(state.clone().into()).unwrap();
        store.save().unwrap();

        let mut record = store.get(Kind::State, state.id()).unwrap().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        if let Record::State(s) = &mut record {
            s.name = "Alexandria".to_string();
        }
        store.save_record(&mut record).unwrap();

        let stored = State::try_from(store.get(Kind::State, state.id()).unwrap().unwrap()).unwrap();
        assert_eq!(stored.name, "Alexandria");
        assert_eq!(stored.base.created_at, state.base.created_at);
        assert!(stored.base.updated_at > state.base.updated_at);
    }

    pub fn update_missing_returns_false(store: &mut dyn Storage) {
        let ghost: Record = State::new("Atlantis").into();
        assert!(!store.update(ghost.clone()).unwrap());
        assert!(store.get(Kind::State, ghost.id()).unwrap().is_none());
    }

    pub fn close_discards_unsaved_records(store: &mut dyn Storage) {
        let state: Record = State::new("Unsaved").into();
        store.new(state.clone()).unwrap();
        assert!(store.get(Kind::State, state.id()).unwrap().is_some());

        store.close().unwrap();
        assert!(store.get(Kind::State, state.id()).unwrap().is_none());
    }

    pub fn amenity_link_order_survives_save(store: &mut dyn Storage) {
        let state = State::new("Cairo");
        let city = City::new("Giza", state.id());
        let user = User::new("host@hbnb.io", "pswrd");
        let first = Amenity::new("Wifi");
        let second = Amenity::new("Pool");
        let (high, low) = if first.id() > second.id() {
            (first.id().to_string(), second.id().to_string())
        } else {
            (second.id().to_string(), first.id().to_string())
        };

        // Linked against lexical order
        let mut place = Place::new("Nile view", city.id(), user.id());
        place.add_amenity(&high);
        place.add_amenity(&low);

        let place: Record = place.into();
        for record in [
            Record::from(state),
            Record::from(city),
            Record::from(user),
            Record::from(first),
            Record::from(second),
            place.clone(),
        ] {
            store.new(record).unwrap();
        }
        store.save().unwrap();

        assert_eq!(store.get(Kind::Place, place.id()).unwrap(), Some(place));
    }
}
