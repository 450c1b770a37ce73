//! Storage collaborators for ingestion.
//!
//! This crate names the storage surfaces the ingestion orchestrator talks to
//! (blob containers, notification queues, and the status table) as traits,
//! and provides a factory that constructs typed clients from service-issued
//! credentialed URLs. The concrete SDKs behind those surfaces are
//! interchangeable; the implementations here, an `object_store`-backed local
//! factory and in-memory recording clients, cover development and testing.

pub mod error;
pub mod local;
pub mod memory;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use barge_control_plane::resources::ResourceUri;

pub use error::{Result, StorageError};
pub use local::{LocalStorageFactory, TemporaryStorageFactory};
pub use memory::InMemoryStorageFactory;
pub use types::{QueueRequestOptions, TableEntity};

/// Client addressing one blob container.
#[async_trait::async_trait]
pub trait ContainerClient: Send + Sync {
    /// Upload `data` as a blob named `blob_name` inside this container.
    ///
    /// When `compress` is set the payload should be gzip-encoded on the way
    /// out; callers account for that in the blob name they pick.
    async fn upload_blob(&self, blob_name: &str, data: Bytes, compress: bool) -> Result<()>;
}

/// Client addressing one queue.
#[async_trait::async_trait]
pub trait QueueClient: Send + Sync {
    /// Post a UTF-8 message onto the queue.
    async fn post_message(&self, content: &str) -> Result<()>;
}

/// Client addressing one key-value table.
#[async_trait::async_trait]
pub trait TableClient: Send + Sync {
    /// Insert a new entity. Fails if the `(partition, row)` key exists.
    async fn insert_entity(&self, entity: TableEntity) -> Result<()>;
}

/// Options applied when constructing storage clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageClientOptions {
    /// Per-call timeout for uploads and other storage requests.
    pub upload_timeout: Duration,
}

impl Default for StorageClientOptions {
    fn default() -> Self {
        Self {
            upload_timeout: Duration::from_secs(10 * 60),
        }
    }
}

/// Factory constructing typed storage clients from credentialed URLs.
///
/// The resource manager calls this once per handle per refresh; constructed
/// clients are self-contained (the credential travels inside the handle) and
/// stay usable after the handle's pool has been replaced.
pub trait StorageClientFactory: Send + Sync {
    fn container_client(&self, uri: &ResourceUri) -> Result<Arc<dyn ContainerClient>>;

    fn queue_client(
        &self,
        uri: &ResourceUri,
        options: Option<&QueueRequestOptions>,
    ) -> Result<Arc<dyn QueueClient>>;

    fn table_client(&self, uri: &ResourceUri) -> Result<Arc<dyn TableClient>>;
}
