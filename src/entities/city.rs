// City Entity - belongs to a State, owns Places

use super::{BaseModel, Entity, Kind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(flatten)]
    pub base: BaseModel,

    #[serde(default)]
    pub name: String,

    /// Owning State (foreign key)
    #[serde(default)]
    pub state_id: String,
}

impl City {
    pub fn new(name: impl Into<String>, state_id: impl Into<String>) -> Self {
        City {
            base: BaseModel::new(),
            name: name.into(),
            state_id: state_id.into(),
        }
    }
}

impl Entity for City {
    const KIND: Kind = Kind::City;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }
}
