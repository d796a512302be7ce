// State Entity - top of the location hierarchy, owns Cities

use super::{BaseModel, Entity, Kind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(flatten)]
    pub base: BaseModel,

    #[serde(default)]
    pub name: String,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        State {
            base: BaseModel::new(),
            name: name.into(),
        }
    }
}

impl Entity for State {
    const KIND: Kind = Kind::State;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }
}
