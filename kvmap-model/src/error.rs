//! Error types for the entity model.

use crate::schema::FieldType;
use crate::value::ValueKind;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by schemas and entity property access.
///
/// Assignment errors are raised before the entity is touched, so an entity
/// that holds a value always satisfies its schema's type contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A property was assigned the undefined marker rather than null.
    #[error(
        "Property '{property}' on entity of type '{entity_type}' cannot be set to undefined. Use null instead."
    )]
    UndefinedAssignment {
        property: String,
        entity_type: String,
    },

    /// A property was assigned a value of the wrong type.
    #[error("Property '{property}' expected type of '{expected}' but received type of '{received}'.")]
    TypeMismatch {
        property: String,
        expected: FieldType,
        received: ValueKind,
    },

    /// The property is not declared by the entity's schema.
    #[error("Property '{property}' is not defined on entity of type '{entity_type}'.")]
    UnknownProperty {
        property: String,
        entity_type: String,
    },

    /// The raw stored value cannot be read as the declared type.
    #[error("Property '{property}' holds a stored value of type '{found}' that cannot be read as '{expected}'.")]
    InvalidStoredValue {
        property: String,
        expected: FieldType,
        found: ValueKind,
    },

    /// Two fields share a logical name.
    #[error("duplicate field '{property}' in schema for '{entity_type}'")]
    DuplicateField {
        entity_type: String,
        property: String,
    },

    /// Two fields resolve to the same physical name.
    #[error("fields '{first}' and '{second}' of '{entity_type}' are both stored as '{alias}'")]
    DuplicateAlias {
        entity_type: String,
        alias: String,
        first: String,
        second: String,
    },

    /// An array field was given an empty separator.
    #[error("array field '{property}' has an empty separator")]
    EmptySeparator { property: String },
}
