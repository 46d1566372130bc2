use crate::error::{ApiError, NameServiceError, StoreError};
use crate::types::{ContentAddress, Key, KeyId, NameRecord, NodeIdentity};
use async_trait::async_trait;
use std::path::Path;

/// Identity query against the node.
#[async_trait]
pub trait NodeInfo: Send + Sync {
    async fn identity(&self) -> Result<NodeIdentity, ApiError>;
}

/// Enumerates the signing keys the node holds.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn list_keys(&self) -> Result<Vec<Key>, ApiError>;
}

/// Content-addressed storage on the node.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Recursively ingests the directory tree rooted at `path` and returns
    /// the address of its root.
    async fn add_directory(&self, path: &Path) -> Result<ContentAddress, StoreError>;

    /// Protects `address` from garbage collection.
    async fn pin(&self, address: &ContentAddress) -> Result<(), StoreError>;

    /// Lifts the protection placed by [`ContentStore::pin`].
    async fn unpin(&self, address: &ContentAddress) -> Result<(), StoreError>;

    /// Deletes the node's local copy of `address`.
    async fn remove(&self, address: &ContentAddress, recursive: bool) -> Result<(), StoreError>;
}

/// Mutable name pointers signed by node keys.
#[async_trait]
pub trait NameService: Send + Sync {
    /// Returns the address currently published under `key`.
    ///
    /// Fails with [`ApiError::NotFound`] when the key never published or its
    /// record expired.
    async fn resolve(&self, key: &KeyId) -> Result<ContentAddress, NameServiceError>;

    /// Creates or overwrites the record for `record.key`.
    async fn publish(&self, record: &NameRecord) -> Result<NameRecord, NameServiceError>;
}

/// Everything the publish workflow needs from a node.
pub trait Node: NodeInfo + KeyStore + ContentStore + NameService {}

impl<T: NodeInfo + KeyStore + ContentStore + NameService> Node for T {}
