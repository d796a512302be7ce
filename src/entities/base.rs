// Base Model - identity + timestamps shared by every entity
//
// Identity is assigned once at creation and never changes.
// `updated_at` moves forward on every save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseModel {
    /// Stable identity (UUID v4) - NEVER changes
    pub id: String,

    /// When the record was constructed
    pub created_at: DateTime<Utc>,

    /// Last modification, refreshed on every save
    pub updated_at: DateTime<Utc>,
}

impl BaseModel {
    /// Fresh identity, both timestamps set to now
    pub fn new() -> Self {
        let now = Utc::now();

        BaseModel {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for BaseModel {
    fn default() -> Self {
        Self::new()
    }
}
