// Place Entity - a rentable listing
//
// Belongs to a City and a User (owner), owns Reviews, and links to
// Amenities many-to-many through `amenity_ids`.

use super::{BaseModel, Entity, Kind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub base: BaseModel,

    #[serde(default)]
    pub city_id: String,

    /// Owner
    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub number_rooms: i64,

    #[serde(default)]
    pub number_bathrooms: i64,

    #[serde(default)]
    pub max_guest: i64,

    #[serde(default)]
    pub price_by_night: i64,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub amenity_ids: Vec<String>,
}

impl Place {
    pub fn new(
        name: impl Into<String>,
        city_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Place {
            base: BaseModel::new(),
            city_id: city_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            description: None,
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: None,
            longitude: None,
            amenity_ids: Vec::new(),
        }
    }

    pub fn has_amenity(&self, amenity_id: &str) -> bool {
        self.amenity_ids.iter().any(|id| id == amenity_id)
    }

    /// Link an amenity. Returns false if it was already linked.
    pub fn add_amenity(&mut self, amenity_id: &str) -> bool {
        if self.has_amenity(amenity_id) {
            return false;
        }
        self.amenity_ids.push(amenity_id.to_string());
        true
    }

    /// Unlink an amenity. Returns false if it was not linked.
    pub fn remove_amenity(&mut self, amenity_id: &str) -> bool {
        let before = self.amenity_ids.len();
        self.amenity_ids.retain(|id| id != amenity_id);
        self.amenity_ids.len() != before
    }
}

impl Entity for Place {
    const KIND: Kind = Kind::Place;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }
}
