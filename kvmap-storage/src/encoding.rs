//! Leaf encoders for the two storage layouts.
//!
//! Both layouts share the key and emptiness rules in the repository; they
//! differ only in how a single field value is written and read back.

use crate::error::{StorageError, StorageResult};
use kvmap_model::{
    EpochUnit, FieldSchema, StorageEncoding, Value, format_number, number_to_json,
};
use std::collections::HashMap;
use tracing::warn;

/// Encoded field set for one entity, in the shape its store expects.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedFields {
    Hash(HashMap<String, String>),
    Document(serde_json::Map<String, serde_json::Value>),
}

impl EncodedFields {
    pub fn new(encoding: StorageEncoding) -> Self {
        match encoding {
            StorageEncoding::Hash => EncodedFields::Hash(HashMap::new()),
            StorageEncoding::Document => EncodedFields::Document(serde_json::Map::new()),
        }
    }

    /// Encodes `value` and stores it under the field's physical name.
    pub fn insert(&mut self, field: &FieldSchema, value: &Value, epoch_unit: EpochUnit) {
        let name = field.physical_name().to_string();
        match self {
            EncodedFields::Hash(fields) => {
                fields.insert(name, encode_hash_value(field, value, epoch_unit));
            }
            EncodedFields::Document(fields) => {
                fields.insert(name, encode_document_value(value, epoch_unit));
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EncodedFields::Hash(fields) => fields.len(),
            EncodedFields::Document(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Encodes a value as a hash field. Flat hashes only hold strings.
pub fn encode_hash_value(field: &FieldSchema, value: &Value, epoch_unit: EpochUnit) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => format_number(*n),
        Value::Boolean(true) => "1".to_string(),
        Value::Boolean(false) => "0".to_string(),
        Value::Array(items) => items
            .iter()
            .map(Value::to_text)
            .collect::<Vec<_>>()
            .join(field.separator()),
        Value::Date(d) => epoch_unit.to_epoch(d).to_string(),
        Value::GeoPoint(p) => p.to_string(),
    }
}

/// Encodes a value as a document member.
///
/// Everything is native except points, which keep the `"<lon>,<lat>"` text
/// form used by hashes.
pub fn encode_document_value(value: &Value, epoch_unit: EpochUnit) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Number(n) => number_to_json(*n),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Array(items) => serde_json::Value::Array(
            items
                .iter()
                .map(|item| serde_json::Value::String(item.to_text()))
                .collect(),
        ),
        Value::Date(d) => serde_json::Value::from(epoch_unit.to_epoch(d)),
        Value::GeoPoint(p) => serde_json::Value::String(p.to_string()),
    }
}

/// Turns a hash reply into raw entity data. Conversion to declared types
/// happens in the entity's getters.
pub fn decode_hash(fields: HashMap<String, String>) -> HashMap<String, Value> {
    fields
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect()
}

/// Turns a document reply into raw entity data.
///
/// Nulls are dropped. Nested objects have no entity representation and are
/// skipped with a warning.
pub fn decode_document(document: serde_json::Value) -> StorageResult<HashMap<String, Value>> {
    let members = match document {
        serde_json::Value::Object(members) => members,
        other => {
            return Err(StorageError::InvalidData(format!(
                "expected a JSON object, got {other}"
            )));
        }
    };

    let mut data = HashMap::with_capacity(members.len());
    for (name, member) in members {
        match decode_json(&member) {
            Some(value) => {
                data.insert(name, value);
            }
            None if member.is_null() => {}
            None => warn!(field = %name, "skipping document member with no entity representation"),
        }
    }
    Ok(data)
}

fn decode_json(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
        serde_json::Value::Bool(b) => Some(Value::Boolean(*b)),
        serde_json::Value::Array(items) => {
            Some(Value::Array(items.iter().filter_map(decode_json).collect()))
        }
        serde_json::Value::Null | serde_json::Value::Object(_) => None,
    }
}
