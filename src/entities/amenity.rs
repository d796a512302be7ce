// Amenity Entity - linked to Places many-to-many

use super::{BaseModel, Entity, Kind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub base: BaseModel,

    #[serde(default)]
    pub name: String,
}

impl Amenity {
    pub fn new(name: impl Into<String>) -> Self {
        Amenity {
            base: BaseModel::new(),
            name: name.into(),
        }
    }
}

impl Entity for Amenity {
    const KIND: Kind = Kind::Amenity;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }
}
