use crate::error::{ModelError, ModelResult};
use crate::schema::{EntitySchema, EpochUnit, FieldSchema, FieldType};
use crate::value::{GeoPoint, Value, ValueKind};
use chrono::{DateTime, Utc};
use serde::ser::{Error as _, SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// What to do with a property on assignment.
///
/// `Null` clears the property. `Undefined` is always rejected: it marks a
/// caller that forgot to supply a value, as opposed to one that meant to
/// clear it.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Undefined,
    Null,
    Value(Value),
}

impl From<Value> for Assignment {
    fn from(value: Value) -> Self {
        Assignment::Value(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Assignment {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Assignment::Value(v.into()),
            None => Assignment::Null,
        }
    }
}

/// An entity bound to a schema.
///
/// `entity_data` is keyed by physical field name and holds raw values; a
/// missing key means the property is null. Data passed to [`Entity::new`] is
/// taken as-is. Only the typed setters validate.
#[derive(Debug, Clone)]
pub struct Entity {
    entity_id: String,
    schema: Arc<EntitySchema>,
    entity_data: HashMap<String, Value>,
}

impl Entity {
    pub fn new(
        schema: Arc<EntitySchema>,
        entity_id: impl Into<String>,
        entity_data: HashMap<String, Value>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            schema,
            entity_data,
        }
    }

    /// Creates an entity with no data; every property reads as null.
    pub fn empty(schema: Arc<EntitySchema>, entity_id: impl Into<String>) -> Self {
        Self::new(schema, entity_id, HashMap::new())
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// The schema's entity name.
    pub fn entity_type(&self) -> &str {
        self.schema.entity_name()
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// Raw data keyed by physical field name.
    pub fn entity_data(&self) -> &HashMap<String, Value> {
        &self.entity_data
    }

    /// Raw value stored under a physical field name.
    pub fn raw(&self, physical_name: &str) -> Option<&Value> {
        self.entity_data.get(physical_name)
    }

    /// Returns true when no declared field holds a value.
    pub fn is_empty(&self) -> bool {
        self.schema
            .fields()
            .iter()
            .all(|field| !self.entity_data.contains_key(field.physical_name()))
    }

    fn field(&self, name: &str) -> ModelResult<&FieldSchema> {
        self.schema
            .field(name)
            .ok_or_else(|| ModelError::UnknownProperty {
                property: name.to_string(),
                entity_type: self.schema.entity_name().to_string(),
            })
    }

    // ── Getters ──────────────────────────────────────────────────

    /// Reads a property by logical name, converted to its declared type.
    pub fn get(&self, name: &str) -> ModelResult<Option<Value>> {
        let field = self.field(name)?;
        self.read(field)
    }

    /// Reads the value of a schema field, converted to its declared type.
    pub fn read(&self, field: &FieldSchema) -> ModelResult<Option<Value>> {
        let Some(raw) = self.entity_data.get(field.physical_name()) else {
            return Ok(None);
        };
        convert(field, self.schema.epoch_unit(), raw)
            .map(Some)
            .ok_or_else(|| ModelError::InvalidStoredValue {
                property: field.name().to_string(),
                expected: field.field_type(),
                found: raw.kind(),
            })
    }

    pub fn get_string(&self, name: &str) -> ModelResult<Option<String>> {
        Ok(match self.get(name)? {
            Some(Value::String(s)) => Some(s),
            _ => None,
        })
    }

    pub fn get_number(&self, name: &str) -> ModelResult<Option<f64>> {
        Ok(self.get(name)?.and_then(|v| v.as_f64()))
    }

    pub fn get_boolean(&self, name: &str) -> ModelResult<Option<bool>> {
        Ok(self.get(name)?.and_then(|v| v.as_bool()))
    }

    pub fn get_array(&self, name: &str) -> ModelResult<Option<Vec<String>>> {
        Ok(match self.get(name)? {
            Some(Value::Array(items)) => Some(items.iter().map(Value::to_text).collect()),
            _ => None,
        })
    }

    pub fn get_date(&self, name: &str) -> ModelResult<Option<DateTime<Utc>>> {
        Ok(match self.get(name)? {
            Some(Value::Date(d)) => Some(d),
            _ => None,
        })
    }

    pub fn get_geo_point(&self, name: &str) -> ModelResult<Option<GeoPoint>> {
        Ok(match self.get(name)? {
            Some(Value::GeoPoint(p)) => Some(p),
            _ => None,
        })
    }

    // ── Setters ──────────────────────────────────────────────────

    /// Assigns a property by logical name.
    ///
    /// Array fields accept any array and store every element as a string.
    /// Every other type must match exactly.
    pub fn assign(&mut self, name: &str, assignment: impl Into<Assignment>) -> ModelResult<()> {
        let field = self.field(name)?;
        match assignment.into() {
            Assignment::Undefined => Err(ModelError::UndefinedAssignment {
                property: name.to_string(),
                entity_type: self.schema.entity_name().to_string(),
            }),
            Assignment::Null => {
                let physical = field.physical_name().to_string();
                self.entity_data.remove(&physical);
                Ok(())
            }
            Assignment::Value(value) => {
                let value = coerce(field, value)?;
                let physical = field.physical_name().to_string();
                self.entity_data.insert(physical, value);
                Ok(())
            }
        }
    }

    /// Sets a property to a non-null value.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        self.assign(name, Assignment::Value(value.into()))
    }

    /// Clears a property. Clearing an absent property is a no-op.
    pub fn clear(&mut self, name: &str) -> ModelResult<()> {
        self.assign(name, Assignment::Null)
    }
}

/// Serializes as `entityId` followed by every declared field in schema
/// order, with `null` for absent fields.
impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.schema.fields();
        let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
        map.serialize_entry("entityId", &self.entity_id)?;
        for field in fields {
            let value = self.read(field).map_err(S::Error::custom)?;
            map.serialize_entry(field.name(), &value)?;
        }
        map.end()
    }
}

fn declared_kind(field_type: FieldType) -> ValueKind {
    match field_type {
        FieldType::String => ValueKind::String,
        FieldType::Number => ValueKind::Number,
        FieldType::Boolean => ValueKind::Boolean,
        FieldType::Array => ValueKind::Array,
        FieldType::Date => ValueKind::Date,
        FieldType::GeoPoint => ValueKind::GeoPoint,
    }
}

/// Validates an assigned value against its field, normalizing arrays to
/// arrays of strings.
fn coerce(field: &FieldSchema, value: Value) -> ModelResult<Value> {
    match (field.field_type(), value) {
        (FieldType::Array, Value::Array(items)) => Ok(Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Value::String(s),
                    other => Value::String(other.to_text()),
                })
                .collect(),
        )),
        (field_type, value) if value.kind() == declared_kind(field_type) => Ok(value),
        (field_type, value) => Err(ModelError::TypeMismatch {
            property: field.name().to_string(),
            expected: field_type,
            received: value.kind(),
        }),
    }
}

/// Converts a raw stored value to the field's logical type.
///
/// Raw values loaded from a flat hash are strings, so every type accepts its
/// textual form as well as its native one.
fn convert(field: &FieldSchema, epoch_unit: EpochUnit, raw: &Value) -> Option<Value> {
    match field.field_type() {
        FieldType::String => match raw {
            Value::Array(_) => None,
            other => Some(Value::String(other.to_text())),
        },
        FieldType::Number => match raw {
            Value::Number(n) => Some(Value::Number(*n)),
            Value::String(s) => s.trim().parse::<f64>().ok().map(Value::Number),
            _ => None,
        },
        FieldType::Boolean => match raw {
            Value::Boolean(b) => Some(Value::Boolean(*b)),
            Value::String(s) => match s.as_str() {
                "1" | "true" => Some(Value::Boolean(true)),
                "0" | "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            _ => None,
        },
        FieldType::Array => match raw {
            Value::Array(items) => Some(Value::Array(
                items.iter().map(|v| Value::String(v.to_text())).collect(),
            )),
            Value::String(s) if s.is_empty() => Some(Value::Array(Vec::new())),
            Value::String(s) => Some(Value::Array(
                s.split(field.separator())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            )),
            _ => None,
        },
        FieldType::Date => match raw {
            Value::Date(d) => Some(Value::Date(*d)),
            Value::Number(n) => epoch_unit.date_from_epoch(*n).map(Value::Date),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(n) => epoch_unit.date_from_epoch(n).map(Value::Date),
                Err(_) => DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|d| Value::Date(d.with_timezone(&Utc))),
            },
            _ => None,
        },
        FieldType::GeoPoint => match raw {
            Value::GeoPoint(p) => Some(Value::GeoPoint(*p)),
            Value::String(s) => s.parse::<GeoPoint>().ok().map(Value::GeoPoint),
            _ => None,
        },
    }
}
