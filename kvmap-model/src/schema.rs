use crate::error::{ModelError, ModelResult};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Separator used to flatten array fields when none is configured.
pub const DEFAULT_SEPARATOR: &str = ",";

/// The declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Date,
    GeoPoint,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Date => "date",
            FieldType::GeoPoint => "geopoint",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How entities of a schema are laid out in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageEncoding {
    /// A flat hash of string fields.
    #[default]
    Hash,
    /// A nested document with native JSON values.
    Document,
}

/// Unit of the epoch value dates are stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochUnit {
    #[default]
    Seconds,
    Milliseconds,
}

impl EpochUnit {
    /// Converts a date to its epoch value in this unit.
    pub fn to_epoch(self, date: &DateTime<Utc>) -> i64 {
        match self {
            EpochUnit::Seconds => date.timestamp(),
            EpochUnit::Milliseconds => date.timestamp_millis(),
        }
    }

    /// Converts an epoch value in this unit back to a date.
    ///
    /// Fractional seconds are kept to millisecond precision.
    pub fn date_from_epoch(self, epoch: f64) -> Option<DateTime<Utc>> {
        if !epoch.is_finite() {
            return None;
        }
        let millis = match self {
            EpochUnit::Seconds => (epoch * 1000.0).round(),
            EpochUnit::Milliseconds => epoch.round(),
        };
        Utc.timestamp_millis_opt(millis as i64).single()
    }
}

/// One logical property of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    /// Physical field name in the store. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
    /// Join/split delimiter for array fields in flat encodings.
    #[serde(default = "default_separator")]
    separator: String,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl FieldSchema {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            alias: None,
            separator: default_separator(),
        }
    }

    /// Shorthand for a string field.
    pub fn string(name: &str) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Shorthand for a numeric field.
    pub fn number(name: &str) -> Self {
        Self::new(name, FieldType::Number)
    }

    /// Shorthand for a boolean field.
    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Shorthand for an array-of-strings field.
    pub fn array(name: &str) -> Self {
        Self::new(name, FieldType::Array)
    }

    /// Shorthand for a date field.
    pub fn date(name: &str) -> Self {
        Self::new(name, FieldType::Date)
    }

    /// Shorthand for a geographic point field.
    pub fn geo_point(name: &str) -> Self {
        Self::new(name, FieldType::GeoPoint)
    }

    /// Stores the field under `alias` instead of its logical name.
    #[must_use]
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name this field is stored under.
    pub fn physical_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }
}

/// Describes an entity type: its name, ordered fields, and storage layout.
///
/// Logical names are resolved to fields once, when the schema is built.
/// Field order is preserved and drives serialization and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "EntitySchemaDefinition", into = "EntitySchemaDefinition")]
pub struct EntitySchema {
    entity_name: String,
    fields: Vec<FieldSchema>,
    encoding: StorageEncoding,
    epoch_unit: EpochUnit,
    by_name: HashMap<String, usize>,
}

impl EntitySchema {
    /// Builds a schema, rejecting duplicate logical or physical names and
    /// empty array separators.
    pub fn new(
        entity_name: &str,
        encoding: StorageEncoding,
        fields: Vec<FieldSchema>,
    ) -> ModelResult<Self> {
        let by_name = index_fields(entity_name, &fields)?;
        Ok(Self {
            entity_name: entity_name.into(),
            fields,
            encoding,
            epoch_unit: EpochUnit::default(),
            by_name,
        })
    }

    /// Shorthand for a schema stored as a flat hash.
    pub fn hash(entity_name: &str, fields: Vec<FieldSchema>) -> ModelResult<Self> {
        Self::new(entity_name, StorageEncoding::Hash, fields)
    }

    /// Shorthand for a schema stored as a document.
    pub fn document(entity_name: &str, fields: Vec<FieldSchema>) -> ModelResult<Self> {
        Self::new(entity_name, StorageEncoding::Document, fields)
    }

    #[must_use]
    pub fn with_epoch_unit(mut self, epoch_unit: EpochUnit) -> Self {
        self.epoch_unit = epoch_unit;
        self
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn encoding(&self) -> StorageEncoding {
        self.encoding
    }

    pub fn epoch_unit(&self) -> EpochUnit {
        self.epoch_unit
    }

    /// Looks up a field by its logical name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.by_name.get(name).map(|&index| &self.fields[index])
    }

    /// Resolves a logical name to the name it is stored under.
    pub fn physical_name(&self, name: &str) -> Option<&str> {
        self.field(name).map(FieldSchema::physical_name)
    }
}

/// Maps logical names to field positions, checking the schema invariants.
fn index_fields(entity_name: &str, fields: &[FieldSchema]) -> ModelResult<HashMap<String, usize>> {
    let mut by_name = HashMap::with_capacity(fields.len());
    let mut physical: HashMap<&str, usize> = HashMap::with_capacity(fields.len());

    for (index, field) in fields.iter().enumerate() {
        if by_name.insert(field.name.clone(), index).is_some() {
            return Err(ModelError::DuplicateField {
                entity_type: entity_name.to_string(),
                property: field.name.clone(),
            });
        }
        if let Some(other) = physical.insert(field.physical_name(), index) {
            return Err(ModelError::DuplicateAlias {
                entity_type: entity_name.to_string(),
                alias: field.physical_name().to_string(),
                first: fields[other].name.clone(),
                second: field.name.clone(),
            });
        }
        if field.field_type == FieldType::Array && field.separator.is_empty() {
            return Err(ModelError::EmptySeparator {
                property: field.name.clone(),
            });
        }
    }
    Ok(by_name)
}

/// Serialized form of [`EntitySchema`]; goes through [`EntitySchema::new`]
/// on the way in so definitions loaded from JSON are validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntitySchemaDefinition {
    entity_name: String,
    #[serde(default)]
    encoding: StorageEncoding,
    #[serde(default)]
    epoch_unit: EpochUnit,
    fields: Vec<FieldSchema>,
}

impl TryFrom<EntitySchemaDefinition> for EntitySchema {
    type Error = ModelError;

    fn try_from(def: EntitySchemaDefinition) -> ModelResult<Self> {
        Ok(Self::new(&def.entity_name, def.encoding, def.fields)?.with_epoch_unit(def.epoch_unit))
    }
}

impl From<EntitySchema> for EntitySchemaDefinition {
    fn from(schema: EntitySchema) -> Self {
        Self {
            entity_name: schema.entity_name,
            encoding: schema.encoding,
            epoch_unit: schema.epoch_unit,
            fields: schema.fields,
        }
    }
}
