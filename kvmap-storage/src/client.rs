//! Store client abstraction.
//!
//! The repository talks to the key-value store only through [`StoreClient`].
//! Connection handling, retries and timeouts belong to implementations.

use crate::error::StorageResult;
use async_trait::async_trait;
use std::collections::HashMap;

/// The store primitives a repository needs.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Replaces the whole field set stored at `key` with `fields`.
    async fn write_all_fields(&self, key: &str, fields: HashMap<String, String>)
    -> StorageResult<()>;

    /// Replaces the whole document stored at `key`.
    async fn write_document(&self, key: &str, document: serde_json::Value) -> StorageResult<()>;

    /// Removes `key`, whatever it holds.
    async fn delete_key(&self, key: &str) -> StorageResult<()>;

    /// Reads every field stored at `key`. Empty when the key does not exist.
    async fn read_all_fields(&self, key: &str) -> StorageResult<HashMap<String, String>>;

    /// Reads the document stored at `key`, if any.
    async fn read_document(&self, key: &str) -> StorageResult<Option<serde_json::Value>>;
}

/// A command issued to a [`memory::MemoryClient`], in the order received.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    WriteAllFields {
        key: String,
        fields: HashMap<String, String>,
    },
    WriteDocument {
        key: String,
        document: serde_json::Value,
    },
    DeleteKey {
        key: String,
    },
}

/// An in-process store for tests and embedding.
pub mod memory {
    use super::*;
    use crate::error::StorageError;
    use tokio::sync::RwLock;

    #[derive(Debug, Clone)]
    enum Stored {
        Hash(HashMap<String, String>),
        /// Documents are kept as JSON text, as a document store would.
        Document(String),
    }

    #[derive(Debug, Default)]
    struct State {
        keys: HashMap<String, Stored>,
        commands: Vec<StoreCommand>,
    }

    /// Holds hashes and documents in memory and records every write and
    /// delete it receives. Writes replace whatever the key held before.
    #[derive(Debug, Default)]
    pub struct MemoryClient {
        state: RwLock<State>,
    }

    impl MemoryClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// Commands received so far, oldest first.
        pub async fn commands(&self) -> Vec<StoreCommand> {
            self.state.read().await.commands.clone()
        }

        /// Forgets the recorded commands, keeping stored data.
        pub async fn clear_commands(&self) {
            self.state.write().await.commands.clear();
        }

        pub async fn contains_key(&self, key: &str) -> bool {
            self.state.read().await.keys.contains_key(key)
        }

        pub async fn len(&self) -> usize {
            self.state.read().await.keys.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.state.read().await.keys.is_empty()
        }
    }

    #[async_trait]
    impl StoreClient for MemoryClient {
        async fn write_all_fields(
            &self,
            key: &str,
            fields: HashMap<String, String>,
        ) -> StorageResult<()> {
            let mut state = self.state.write().await;
            state.commands.push(StoreCommand::WriteAllFields {
                key: key.to_string(),
                fields: fields.clone(),
            });
            state.keys.insert(key.to_string(), Stored::Hash(fields));
            Ok(())
        }

        async fn write_document(
            &self,
            key: &str,
            document: serde_json::Value,
        ) -> StorageResult<()> {
            let text = serde_json::to_string(&document)?;
            let mut state = self.state.write().await;
            state.commands.push(StoreCommand::WriteDocument {
                key: key.to_string(),
                document,
            });
            state.keys.insert(key.to_string(), Stored::Document(text));
            Ok(())
        }

        async fn delete_key(&self, key: &str) -> StorageResult<()> {
            let mut state = self.state.write().await;
            state.commands.push(StoreCommand::DeleteKey {
                key: key.to_string(),
            });
            state.keys.remove(key);
            Ok(())
        }

        async fn read_all_fields(&self, key: &str) -> StorageResult<HashMap<String, String>> {
            match self.state.read().await.keys.get(key) {
                None => Ok(HashMap::new()),
                Some(Stored::Hash(fields)) => Ok(fields.clone()),
                Some(Stored::Document(_)) => Err(StorageError::Client(format!(
                    "WRONGTYPE key '{key}' holds a document, not a hash"
                ))),
            }
        }

        async fn read_document(&self, key: &str) -> StorageResult<Option<serde_json::Value>> {
            match self.state.read().await.keys.get(key) {
                None => Ok(None),
                Some(Stored::Document(text)) => Ok(Some(serde_json::from_str(text)?)),
                Some(Stored::Hash(_)) => Err(StorageError::Client(format!(
                    "WRONGTYPE key '{key}' holds a hash, not a document"
                ))),
            }
        }
    }
}
