//! SQLite-backed storage
//!
//! Works like a unit of work: `new`, `update` and `delete` are staged in
//! memory and written in one transaction by `save`. Reads see staged work
//! layered over the database. `close` discards anything not yet saved.
//!
//! Deletes cascade through `ON DELETE CASCADE` foreign keys:
//! State -> City -> Place -> Review, User -> Place/Review, and Place/Amenity
//! links in `place_amenity`.

use super::Storage;
use crate::entities::{self, Amenity, BaseModel, City, Kind, Place, Record, Review, State, User};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub struct DbStorage {
    conn: Connection,
    /// New or modified records waiting for `save`, keyed "Kind.id"
    pending: BTreeMap<String, Record>,
    /// Records staged for deletion
    deleted: BTreeSet<(Kind, String)>,
}

impl DbStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(DbStorage {
            conn,
            pending: BTreeMap::new(),
            deleted: BTreeSet::new(),
        })
    }

    /// Drop every table and recreate an empty schema
    pub fn drop_all(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "DROP TABLE IF EXISTS place_amenity;
             DROP TABLE IF EXISTS reviews;
             DROP TABLE IF EXISTS places;
             DROP TABLE IF EXISTS cities;
             DROP TABLE IF EXISTS states;
             DROP TABLE IF EXISTS amenities;
             DROP TABLE IF EXISTS users;",
        )?;
        setup_database(&self.conn)?;
        self.pending.clear();
        self.deleted.clear();
        Ok(())
    }

    fn is_deleted(&self, kind: Kind, id: &str) -> bool {
        self.deleted.contains(&(kind, id.to_string()))
    }

    /// Rows of one kind straight from the database, ignoring staged work
    fn load(&self, kind: Kind, id: Option<&str>) -> Result<Vec<Record>> {
        let columns = match kind {
            Kind::State | Kind::Amenity => "name",
            Kind::City => "name, state_id",
            Kind::User => "email, password, first_name, last_name",
            Kind::Place => {
                "city_id, user_id, name, description, number_rooms, number_bathrooms, \
                 max_guest, price_by_night, latitude, longitude"
            }
            Kind::Review => "place_id, user_id, text",
        };
        let filter = if id.is_some() { " WHERE id = ?1" } else { "" };
        let sql = format!(
            "SELECT id, created_at, updated_at, {} FROM {}{} ORDER BY created_at",
            columns,
            kind.table(),
            filter
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut records = stmt
            .query_map(params_from_iter(id), |row| record_from_row(kind, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for record in &mut records {
            if let Record::Place(place) = record {
                place.amenity_ids = self.amenity_ids(place.base.id.as_str())?;
            }
        }

        Ok(records)
    }

    /// Linked amenity ids in the order they were linked
    fn amenity_ids(&self, place_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT amenity_id FROM place_amenity WHERE place_id = ?1 ORDER BY rowid",
        )?;
        let ids = stmt
            .query_map([place_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }
}

impl Storage for DbStorage {
    fn get(&self, kind: Kind, id: &str) -> Result<Option<Record>> {
        if id.is_empty() || self.is_deleted(kind, id) {
            return Ok(None);
        }
        if let Some(record) = self.pending.get(&entities::key(kind, id)) {
            return Ok(Some(record.clone()));
        }
        Ok(self.load(kind, Some(id))?.into_iter().next())
    }

    fn all(&self, kind: Option<Kind>) -> Result<BTreeMap<String, Record>> {
        let kinds: Vec<Kind> = match kind {
            Some(k) => vec![k],
            None => Kind::ALL.to_vec(),
        };

        let mut objects = BTreeMap::new();
        for k in kinds {
            for record in self.load(k, None)? {
                objects.insert(record.key(), record);
            }
        }

        for (key, record) in &self.pending {
            if kind.map_or(true, |k| record.kind() == k) {
                objects.insert(key.clone(), record.clone());
            }
        }
        objects.retain(|_, record| !self.is_deleted(record.kind(), record.id()));

        Ok(objects)
    }

    fn new(&mut self, record: Record) -> Result<()> {
        let kind = record.kind();
        let id = record.id().to_string();

        if self.deleted.remove(&(kind, id.clone())) {
            // Re-adding something staged for deletion overwrites it on save
            self.pending.insert(record.key(), record);
            return Ok(());
        }
        if self.get(kind, &id)?.is_some() {
            return Ok(());
        }
        self.pending.insert(record.key(), record);
        Ok(())
    }

    fn update(&mut self, record: Record) -> Result<bool> {
        if self.get(record.kind(), record.id())?.is_none() {
            return Ok(false);
        }
        self.pending.insert(record.key(), record);
        Ok(true)
    }

    fn save(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;

        for (kind, id) in &self.deleted {
            tx.execute(&format!("DELETE FROM {} WHERE id = ?1", kind.table()), [id])?;
        }

        let mut pending: Vec<&Record> = self.pending.values().collect();
        pending.sort_by_key(|record| record.kind());
        for record in &pending {
            write_record(&tx, record)?;
        }

        tx.commit()?;
        tracing::debug!(
            written = self.pending.len(),
            deleted = self.deleted.len(),
            "database storage committed"
        );

        self.pending.clear();
        self.deleted.clear();
        Ok(())
    }

    fn delete(&mut self, record: &Record) -> Result<()> {
        self.pending.remove(&record.key());
        self.deleted.insert((record.kind(), record.id().to_string()));
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        self.pending.clear();
        self.deleted.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.pending.is_empty() || !self.deleted.is_empty() {
            tracing::debug!(
                pending = self.pending.len(),
                deleted = self.deleted.len(),
                "discarding unsaved work"
            );
        }
        self.reload()
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for file databases; in-memory databases answer "memory"
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS states (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cities (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            name TEXT NOT NULL,
            state_id TEXT NOT NULL REFERENCES states(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            email TEXT NOT NULL,
            password TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT
        );

        CREATE TABLE IF NOT EXISTS amenities (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS places (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            city_id TEXT NOT NULL REFERENCES cities(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            number_rooms INTEGER NOT NULL DEFAULT 0,
            number_bathrooms INTEGER NOT NULL DEFAULT 0,
            max_guest INTEGER NOT NULL DEFAULT 0,
            price_by_night INTEGER NOT NULL DEFAULT 0,
            latitude REAL,
            longitude REAL
        );

        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            place_id TEXT NOT NULL REFERENCES places(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            text TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS place_amenity (
            place_id TEXT NOT NULL REFERENCES places(id) ON DELETE CASCADE,
            amenity_id TEXT NOT NULL REFERENCES amenities(id) ON DELETE CASCADE,
            PRIMARY KEY (place_id, amenity_id)
        );

        CREATE INDEX IF NOT EXISTS idx_cities_state ON cities(state_id);
        CREATE INDEX IF NOT EXISTS idx_places_city ON places(city_id);
        CREATE INDEX IF NOT EXISTS idx_reviews_place ON reviews(place_id);",
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn parse_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Columns 0..3 are always id, created_at, updated_at
fn record_from_row(kind: Kind, row: &Row) -> rusqlite::Result<Record> {
    let base = BaseModel {
        id: row.get(0)?,
        created_at: parse_timestamp(row, 1)?,
        updated_at: parse_timestamp(row, 2)?,
    };

    Ok(match kind {
        Kind::State => Record::State(State {
            base,
            name: row.get(3)?,
        }),
        Kind::Amenity => Record::Amenity(Amenity {
            base,
            name: row.get(3)?,
        }),
        Kind::City => Record::City(City {
            base,
            name: row.get(3)?,
            state_id: row.get(4)?,
        }),
        Kind::User => Record::User(User {
            base,
            email: row.get(3)?,
            password: row.get(4)?,
            first_name: row.get(5)?,
            last_name: row.get(6)?,
        }),
        Kind::Place => Record::Place(Place {
            base,
            city_id: row.get(3)?,
            user_id: row.get(4)?,
            name: row.get(5)?,
            description: row.get(6)?,
            number_rooms: row.get(7)?,
            number_bathrooms: row.get(8)?,
            max_guest: row.get(9)?,
            price_by_night: row.get(10)?,
            latitude: row.get(11)?,
            longitude: row.get(12)?,
            // Filled from place_amenity by the caller
            amenity_ids: Vec::new(),
        }),
        Kind::Review => Record::Review(Review {
            base,
            place_id: row.get(3)?,
            user_id: row.get(4)?,
            text: row.get(5)?,
        }),
    })
}

/// Upsert one record. `ON CONFLICT DO UPDATE` rather than `INSERT OR REPLACE`,
/// which would delete the row first and fire the cascades.
fn write_record(tx: &Transaction, record: &Record) -> rusqlite::Result<()> {
    let base = record.base();
    let created_at = base.created_at.to_rfc3339();
    let updated_at = base.updated_at.to_rfc3339();

    match record {
        Record::State(state) => {
            tx.execute(
                "INSERT INTO states (id, created_at, updated_at, name)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    name = excluded.name",
                params![base.id, created_at, updated_at, state.name],
            )?;
        }
        Record::Amenity(amenity) => {
            tx.execute(
                "INSERT INTO amenities (id, created_at, updated_at, name)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    name = excluded.name",
                params![base.id, created_at, updated_at, amenity.name],
            )?;
        }
        Record::City(city) => {
            tx.execute(
                "INSERT INTO cities (id, created_at, updated_at, name, state_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    name = excluded.name,
                    state_id = excluded.state_id",
                params![base.id, created_at, updated_at, city.name, city.state_id],
            )?;
        }
        Record::User(user) => {
            tx.execute(
                "INSERT INTO users (id, created_at, updated_at, email, password, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    email = excluded.email,
                    password = excluded.password,
                    first_name = excluded.first_name,
                    last_name = excluded.last_name",
                params![
                    base.id,
                    created_at,
                    updated_at,
                    user.email,
                    user.password,
                    user.first_name,
                    user.last_name,
                ],
            )?;
        }
        Record::Place(place) => {
            tx.execute(
                "INSERT INTO places (
                    id, created_at, updated_at, city_id, user_id, name, description,
                    number_rooms, number_bathrooms, max_guest, price_by_night,
                    latitude, longitude
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    city_id = excluded.city_id,
                    user_id = excluded.user_id,
                    name = excluded.name,
                    description = excluded.description,
                    number_rooms = excluded.number_rooms,
                    number_bathrooms = excluded.number_bathrooms,
                    max_guest = excluded.max_guest,
                    price_by_night = excluded.price_by_night,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude",
                params![
                    base.id,
                    created_at,
                    updated_at,
                    place.city_id,
                    place.user_id,
                    place.name,
                    place.description,
                    place.number_rooms,
                    place.number_bathrooms,
                    place.max_guest,
                    place.price_by_night,
                    place.latitude,
                    place.longitude,
                ],
            )?;

            tx.execute("DELETE FROM place_amenity WHERE place_id = ?1", [&base.id])?;
            for amenity_id in &place.amenity_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO place_amenity (place_id, amenity_id) VALUES (?1, ?2)",
                    params![base.id, amenity_id],
                )?;
            }
        }
        Record::Review(review) => {
            tx.execute(
                "INSERT INTO reviews (id, created_at, updated_at, place_id, user_id, text)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    place_id = excluded.place_id,
                    user_id = excluded.user_id,
                    text = excluded.text",
                params![base.id, created_at, updated_at, review.place_id, review.user_id, review.text],
            )?;
        }
    }

    Ok(())
}
