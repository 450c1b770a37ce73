//! In-memory storage collaborators.
//!
//! These implementations record every operation and expose accessors for
//! inspecting them, which makes them the backbone of the ingest test suites.
//! Clients are keyed by the secret-free service URL so a test can look up the
//! client a handle was built around.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use barge_control_plane::resources::ResourceUri;

use crate::error::{Result, StorageError};
use crate::types::{QueueRequestOptions, TableEntity};
use crate::{ContainerClient, QueueClient, StorageClientFactory, TableClient};

/// One recorded blob upload.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub blob_name: String,
    pub data: Bytes,
    pub compressed: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryContainerClient {
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl InMemoryContainerClient {
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().expect("uploads lock").clone()
    }
}

#[async_trait::async_trait]
impl ContainerClient for InMemoryContainerClient {
    async fn upload_blob(&self, blob_name: &str, data: Bytes, compress: bool) -> Result<()> {
        let mut uploads = self.uploads.lock().expect("uploads lock");
        uploads.push(RecordedUpload {
            blob_name: blob_name.to_string(),
            data,
            compressed: compress,
        });
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryQueueClient {
    messages: Mutex<Vec<String>>,
}

impl InMemoryQueueClient {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("messages lock").clone()
    }
}

#[async_trait::async_trait]
impl QueueClient for InMemoryQueueClient {
    async fn post_message(&self, content: &str) -> Result<()> {
        let mut messages = self.messages.lock().expect("messages lock");
        messages.push(content.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTableClient {
    entities: Mutex<Vec<TableEntity>>,
}

impl InMemoryTableClient {
    pub fn entities(&self) -> Vec<TableEntity> {
        self.entities.lock().expect("entities lock").clone()
    }
}

#[async_trait::async_trait]
impl TableClient for InMemoryTableClient {
    async fn insert_entity(&self, entity: TableEntity) -> Result<()> {
        let mut entities = self.entities.lock().expect("entities lock");
        let duplicate = entities.iter().any(|existing| {
            existing.partition_key == entity.partition_key && existing.row_key == entity.row_key
        });
        if duplicate {
            return Err(StorageError::EntityAlreadyExists {
                partition_key: entity.partition_key,
                row_key: entity.row_key,
            });
        }
        entities.push(entity);
        Ok(())
    }
}

/// Factory handing out in-memory clients, one per service URL.
///
/// Repeated requests for the same URL return the same client, so recorded
/// operations accumulate across refreshes.
#[derive(Debug, Default)]
pub struct InMemoryStorageFactory {
    containers: Mutex<HashMap<String, Arc<InMemoryContainerClient>>>,
    queues: Mutex<HashMap<String, Arc<InMemoryQueueClient>>>,
    tables: Mutex<HashMap<String, Arc<InMemoryTableClient>>>,
    last_queue_options: Mutex<Option<QueueRequestOptions>>,
}

impl InMemoryStorageFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The container client for `service_url`, if one was ever constructed.
    pub fn container(&self, service_url: &str) -> Option<Arc<InMemoryContainerClient>> {
        self.containers
            .lock()
            .expect("containers lock")
            .get(service_url)
            .cloned()
    }

    pub fn queue(&self, service_url: &str) -> Option<Arc<InMemoryQueueClient>> {
        self.queues
            .lock()
            .expect("queues lock")
            .get(service_url)
            .cloned()
    }

    pub fn table(&self, service_url: &str) -> Option<Arc<InMemoryTableClient>> {
        self.tables
            .lock()
            .expect("tables lock")
            .get(service_url)
            .cloned()
    }

    /// The queue options most recently passed to [`queue_client`].
    ///
    /// [`queue_client`]: StorageClientFactory::queue_client
    pub fn last_queue_options(&self) -> Option<QueueRequestOptions> {
        self.last_queue_options
            .lock()
            .expect("queue options lock")
            .clone()
    }
}

impl StorageClientFactory for InMemoryStorageFactory {
    fn container_client(&self, uri: &ResourceUri) -> Result<Arc<dyn ContainerClient>> {
        let mut containers = self.containers.lock().expect("containers lock");
        let client = containers
            .entry(uri.service_url().to_string())
            .or_default()
            .clone();
        Ok(client)
    }

    fn queue_client(
        &self,
        uri: &ResourceUri,
        options: Option<&QueueRequestOptions>,
    ) -> Result<Arc<dyn QueueClient>> {
        *self.last_queue_options.lock().expect("queue options lock") = options.cloned();
        let mut queues = self.queues.lock().expect("queues lock");
        let client = queues
            .entry(uri.service_url().to_string())
            .or_default()
            .clone();
        Ok(client)
    }

    fn table_client(&self, uri: &ResourceUri) -> Result<Arc<dyn TableClient>> {
        let mut tables = self.tables.lock().expect("tables lock");
        let client = tables
            .entry(uri.service_url().to_string())
            .or_default()
            .clone();
        Ok(client)
    }
}
