//! Persistence for kvmap entities.
//!
//! A [`Repository`] turns an [`Entity`](kvmap_model::Entity) into exactly one
//! store command per save, using the layout its schema selects.
//!
//! # Architecture
//!
//! - Keys are `<entityName>:<entityId>`
//! - Hash schemas write a flat map of strings; document schemas write a JSON object
//! - Null fields are not written; an entity with no data deletes its key
//! - The store itself is reached through the [`StoreClient`] trait

mod client;
mod encoding;
mod error;
mod repository;

pub use client::memory::MemoryClient;
pub use client::{StoreClient, StoreCommand};
pub use encoding::{
    EncodedFields, decode_document, decode_hash, encode_document_value, encode_hash_value,
};
pub use error::{StorageError, StorageResult};
pub use repository::Repository;
