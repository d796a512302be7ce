// Entity Models
//
// Every entity shares a BaseModel (identity + timestamps) and adds its own
// values. `Record` is the type-erased form the storage layer works with; its
// serialized shape carries a `__class__` discriminator naming the entity.

pub mod amenity;
pub mod base;
pub mod city;
pub mod place;
pub mod review;
pub mod state;
pub mod user;

pub use amenity::Amenity;
pub use base::BaseModel;
pub use city::City;
pub use place::Place;
pub use review::Review;
pub use state::State;
pub use user::User;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fields no payload may overwrite, whatever the entity.
pub const BASE_PROTECTED: [&str; 4] = ["id", "created_at", "updated_at", "__class__"];

// ============================================================================
// KIND
// ============================================================================

/// The six entity types.
///
/// Declaration order is parent-before-child, so sorting by `Kind` gives a
/// valid insert order for foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kind {
    State,
    City,
    User,
    Amenity,
    Place,
    Review,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown record kind: {0}")]
pub struct UnknownKind(pub String);

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::State,
        Kind::City,
        Kind::User,
        Kind::Amenity,
        Kind::Place,
        Kind::Review,
    ];

    /// Class name, as written in `__class__` and composite keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::State => "State",
            Kind::City => "City",
            Kind::User => "User",
            Kind::Amenity => "Amenity",
            Kind::Place => "Place",
            Kind::Review => "Review",
        }
    }

    /// Table backing this kind in the relational backend
    pub fn table(&self) -> &'static str {
        match self {
            Kind::State => "states",
            Kind::City => "cities",
            Kind::User => "users",
            Kind::Amenity => "amenities",
            Kind::Place => "places",
            Kind::Review => "reviews",
        }
    }

    /// Plural name used by the stats endpoint. Same as the table name.
    pub fn plural(&self) -> &'static str {
        self.table()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Composite key "Kind.id" used by `Storage::all`
pub fn key(kind: Kind, id: &str) -> String {
    format!("{}.{}", kind, id)
}

// ============================================================================
// ENTITY TRAIT
// ============================================================================

/// Behaviour shared by the six entity structs.
pub trait Entity: Serialize + DeserializeOwned + Clone + Into<Record> {
    const KIND: Kind;

    fn base(&self) -> &BaseModel;

    fn base_mut(&mut self) -> &mut BaseModel;

    fn id(&self) -> &str {
        &self.base().id
    }

    /// Builds a fresh entity from a client payload.
    ///
    /// Identity and timestamps are always generated here; whatever the
    /// payload says about them is discarded.
    fn from_payload(mut payload: Map<String, Value>) -> serde_json::Result<Self> {
        let base = BaseModel::new();
        for field in BASE_PROTECTED {
            payload.remove(field);
        }
        payload.insert("id".to_string(), Value::String(base.id));
        payload.insert("created_at".to_string(), serde_json::to_value(base.created_at)?);
        payload.insert("updated_at".to_string(), serde_json::to_value(base.updated_at)?);
        serde_json::from_value(Value::Object(payload))
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// Any entity, tagged with its class name when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__class__")]
pub enum Record {
    State(State),
    City(City),
    User(User),
    Amenity(Amenity),
    Place(Place),
    Review(Review),
}

impl Record {
    pub fn kind(&self) -> Kind {
        match self {
            Record::State(_) => Kind::State,
            Record::City(_) => Kind::City,
            Record::User(_) => Kind::User,
            Record::Amenity(_) => Kind::Amenity,
            Record::Place(_) => Kind::Place,
            Record::Review(_) => Kind::Review,
        }
    }

    pub fn base(&self) -> &BaseModel {
        match self {
            Record::State(e) => e.base(),
            Record::City(e) => e.base(),
            Record::User(e) => e.base(),
            Record::Amenity(e) => e.base(),
            Record::Place(e) => e.base(),
            Record::Review(e) => e.base(),
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseModel {
        match self {
            Record::State(e) => e.base_mut(),
            Record::City(e) => e.base_mut(),
            Record::User(e) => e.base_mut(),
            Record::Amenity(e) => e.base_mut(),
            Record::Place(e) => e.base_mut(),
            Record::Review(e) => e.base_mut(),
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    /// Composite "Kind.id" key
    pub fn key(&self) -> String {
        key(self.kind(), self.id())
    }

    /// Refresh the modification timestamp
    pub fn touch(&mut self) {
        self.base_mut().touch();
    }

    /// Dictionary form: every field plus `__class__`, timestamps as ISO-8601.
    pub fn to_dict(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "record serialized to a non-object: {}",
                other
            ))),
        }
    }

    pub fn from_dict(dict: Map<String, Value>) -> serde_json::Result<Record> {
        serde_json::from_value(Value::Object(dict))
    }

    /// A fresh record of `kind` built from a client payload
    pub fn from_payload(kind: Kind, payload: Map<String, Value>) -> serde_json::Result<Record> {
        Ok(match kind {
            Kind::State => State::from_payload(payload)?.into(),
            Kind::City => City::from_payload(payload)?.into(),
            Kind::User => User::from_payload(payload)?.into(),
            Kind::Amenity => Amenity::from_payload(payload)?.into(),
            Kind::Place => Place::from_payload(payload)?.into(),
            Kind::Review => Review::from_payload(payload)?.into(),
        })
    }

    /// Overwrites fields from a client payload.
    ///
    /// Keys in `BASE_PROTECTED` or `protected` are skipped, unknown keys are
    /// ignored, and a value of the wrong type fails the whole update.
    pub fn apply_payload(
        &mut self,
        payload: &Map<String, Value>,
        protected: &[&str],
    ) -> serde_json::Result<()> {
        let mut dict = self.to_dict()?;
        for (field, value) in payload {
            if BASE_PROTECTED.contains(&field.as_str()) || protected.contains(&field.as_str()) {
                continue;
            }
            dict.insert(field.clone(), value.clone());
        }
        *self = Record::from_dict(dict)?;
        Ok(())
    }
}

macro_rules! record_conversions {
    ($($entity:ident),* $(,)?) => {
        $(
            impl From<$entity> for Record {
                fn from(entity: $entity) -> Self {
                    Record::$entity(entity)
                }
            }

            impl TryFrom<Record> for $entity {
                type Error = Record;

                fn try_from(record: Record) -> Result<Self, Self::Error> {
                    match record {
                        Record::$entity(entity) => Ok(entity),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

record_conversions!(State, City, User, Amenity, Place, Review);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in Kind::ALL {
            assert_eq!(kind.as_str().parse::<Kind>().unwrap(), kind);
        }
        assert_eq!(
            "BaseModel".parse::<Kind>(),
            Err(UnknownKind("BaseModel".to_string()))
        );
    }

    #[test]
    fn test_kind_order_puts_parents_first() {
        assert!(Kind::State < Kind::City);
        assert!(Kind::City < Kind::Place);
        assert!(Kind::User < Kind::Place);
        assert!(Kind::Place < Kind::Review);
    }

    #[test]
    fn test_to_dict_carries_class_and_iso_timestamps() {
        let record: Record = State::new("Cairo").into();
        let dict = record.to_dict().unwrap();

        assert_eq!(dict["__class__"], "State");
        assert_eq!(dict["name"], "Cairo");
        assert_eq!(dict["id"], record.id());

        let created = dict["created_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());
    }

    #[test]
    fn test_from_dict_restores_record() {
        let record: Record = City::new("Giza", "state-1").into();
        let restored = Record::from_dict(record.to_dict().unwrap()).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_from_payload_ignores_client_identity() {
        let state = State::from_payload(payload(json!({
            "name": "Cairo",
            "id": "chosen-by-client",
            "created_at": "1999-01-01T00:00:00Z",
        })))
        .unwrap();

        assert_eq!(state.name, "Cairo");
        assert_ne!(state.id(), "chosen-by-client");
        assert_eq!(state.base.created_at, state.base.updated_at);
    }

    #[test]
    fn test_record_from_payload_dispatches_on_kind() {
        let record = Record::from_payload(Kind::Amenity, payload(json!({"name": "Wifi"}))).unwrap();
        assert_eq!(record.kind(), Kind::Amenity);
        assert_eq!(record.to_dict().unwrap()["name"], "Wifi");
    }

    #[test]
    fn test_apply_payload_skips_protected_fields() {
        let city = City::new("Giza", "state-1");
        let original_id = city.id().to_string();
        let mut record: Record = city.into();

        record
            .apply_payload(
                &payload(json!({
                    "id": "new-id",
                    "state_id": "state-2",
                    "name": "Alexandria",
                    "unknown": true,
                })),
                &["state_id"],
            )
            .unwrap();

        let city = City::try_from(record).unwrap();
        assert_eq!(city.id(), original_id);
        assert_eq!(city.state_id, "state-1");
        assert_eq!(city.name, "Alexandria");
    }

    #[test]
    fn test_apply_payload_rejects_wrong_types() {
        let mut record: Record = Place::new("Nile view", "city-1", "user-1").into();
        let result = record.apply_payload(&payload(json!({"number_rooms": "many"})), &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_try_from_wrong_variant_gives_record_back() {
        let record: Record = Amenity::new("Wifi").into();
        let back = State::try_from(record.clone()).unwrap_err();
        assert_eq!(back, record);
    }
}
