//! Repository: creates entities and persists them through a [`StoreClient`].

use crate::client::StoreClient;
use crate::encoding::{EncodedFields, decode_document, decode_hash};
use crate::error::{StorageError, StorageResult};
use kvmap_model::{Entity, EntitySchema, StorageEncoding, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Persists entities of one schema.
///
/// The encoding is taken from the schema. Each call issues at most one
/// store command and keeps no state between calls.
#[derive(Clone)]
pub struct Repository {
    schema: Arc<EntitySchema>,
    client: Arc<dyn StoreClient>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity_name", &self.schema.entity_name())
            .field("encoding", &self.schema.encoding())
            .finish_non_exhaustive()
    }
}

impl Repository {
    pub fn new(schema: Arc<EntitySchema>, client: Arc<dyn StoreClient>) -> Self {
        Self { schema, client }
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// The store key for an entity id: `<entityName>:<entityId>`.
    pub fn key_for(&self, entity_id: &str) -> String {
        format!("{}:{}", self.schema.entity_name(), entity_id)
    }

    /// Creates an empty entity with a fresh, time-ordered id.
    pub fn create_entity(&self) -> Entity {
        Entity::empty(Arc::clone(&self.schema), Uuid::now_v7().to_string())
    }

    /// Creates an entity with a fresh id and the given raw data.
    pub fn create_entity_with(&self, data: HashMap<String, Value>) -> Entity {
        Entity::new(Arc::clone(&self.schema), Uuid::now_v7().to_string(), data)
    }

    /// Saves an entity and returns its id.
    ///
    /// Null fields are left out of the write. When every field is null the
    /// key is deleted instead and nothing is written. Client errors are
    /// returned unchanged; nothing is retried.
    pub async fn save(&self, entity: &Entity) -> StorageResult<String> {
        if entity.entity_type() != self.schema.entity_name() {
            return Err(StorageError::SchemaMismatch {
                expected: self.schema.entity_name().to_string(),
                found: entity.entity_type().to_string(),
            });
        }

        let key = self.key_for(entity.entity_id());
        let encoded = self.encode(entity)?;

        if encoded.is_empty() {
            debug!(%key, "entity has no data, deleting key");
            self.client.delete_key(&key).await?;
            return Ok(entity.entity_id().to_string());
        }

        debug!(%key, fields = encoded.len(), "saving entity");
        match encoded {
            EncodedFields::Hash(fields) => self.client.write_all_fields(&key, fields).await?,
            EncodedFields::Document(members) => {
                self.client
                    .write_document(&key, serde_json::Value::Object(members))
                    .await?
            }
        }
        Ok(entity.entity_id().to_string())
    }

    /// Creates an entity from raw data, saves it, and returns it.
    pub async fn create_and_save(&self, data: HashMap<String, Value>) -> StorageResult<Entity> {
        let entity = self.create_entity_with(data);
        self.save(&entity).await?;
        Ok(entity)
    }

    /// Loads an entity. A missing key yields an entity whose fields are all
    /// null.
    pub async fn fetch(&self, entity_id: &str) -> StorageResult<Entity> {
        let key = self.key_for(entity_id);
        let data = match self.schema.encoding() {
            StorageEncoding::Hash => decode_hash(self.client.read_all_fields(&key).await?),
            StorageEncoding::Document => match self.client.read_document(&key).await? {
                Some(document) => decode_document(document)?,
                None => HashMap::new(),
            },
        };
        debug!(%key, found = !data.is_empty(), "fetched entity");
        Ok(Entity::new(Arc::clone(&self.schema), entity_id, data))
    }

    /// Deletes the key holding an entity.
    pub async fn remove(&self, entity_id: &str) -> StorageResult<()> {
        let key = self.key_for(entity_id);
        debug!(%key, "removing entity");
        self.client.delete_key(&key).await
    }

    /// Encodes every non-null field of `entity` in schema order.
    fn encode(&self, entity: &Entity) -> StorageResult<EncodedFields> {
        let epoch_unit = self.schema.epoch_unit();
        let mut encoded = EncodedFields::new(self.schema.encoding());
        for field in self.schema.fields() {
            if let Some(value) = entity.read(field)? {
                encoded.insert(field, &value, epoch_unit);
            }
        }
        Ok(encoded)
    }
}
