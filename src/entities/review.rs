// Review Entity - written by a User about a Place

use super::{BaseModel, Entity, Kind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub base: BaseModel,

    #[serde(default)]
    pub place_id: String,

    /// Author
    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub text: String,
}

impl Review {
    pub fn new(
        place_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Review {
            base: BaseModel::new(),
            place_id: place_id.into(),
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}

impl Entity for Review {
    const KIND: Kind = Kind::Review;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }
}
