// HBNB - Core Library
// Models, storage backends and (with the `server` feature) the HTTP surface

pub mod config;
pub mod entities;
pub mod error;
pub mod storage;

#[cfg(feature = "server")]
pub mod api;
#[cfg(feature = "server")]
pub mod server;
#[cfg(feature = "server")]
pub mod web;

// Re-export commonly used types
pub use config::{Config, StorageType};
pub use entities::{
    Amenity, BaseModel, City, Entity, Kind, Place, Record, Review, State, User,
};
pub use error::{ConfigError, Result, StorageError};
pub use storage::{DbStorage, FileStorage, Storage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
