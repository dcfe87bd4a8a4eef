//! Typed entity model for kvmap.
//!
//! Defines the schema-driven view over an untyped property bag:
//! - [`Value`]: the closed set of runtime property values
//! - [`FieldSchema`] / [`EntitySchema`]: declared fields, aliases, and storage layout
//! - [`Entity`]: an identifier plus raw data, with typed, validating accessors
//!
//! Storage crates read entities through the schema's field order and the
//! typed getters; they never interpret `entity_data` directly.

mod entity;
mod error;
mod schema;
mod value;

pub use entity::{Assignment, Entity};
pub use error::{ModelError, ModelResult};
pub use schema::{
    DEFAULT_SEPARATOR, EntitySchema, EpochUnit, FieldSchema, FieldType, StorageEncoding,
};
pub use value::{GeoPoint, ParseGeoPointError, Value, ValueKind, format_number, number_to_json};
