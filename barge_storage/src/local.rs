//! Local storage collaborators.
//!
//! `LocalStorageFactory` backs blob containers with the local file system
//! through `object_store`, mapping each container to a subdirectory of the
//! configured root. Queues and tables have no file-system analogue, so the
//! factory hands out in-memory clients for those surfaces.
//!
//! `TemporaryStorageFactory` places the root in a temporary directory that is
//! cleaned up when the factory is dropped, which is what the test suites and
//! development environments want.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::{ObjectStore, PutMode, PutOptions, PutPayload};
use snafu::ResultExt;
use tempfile::TempDir;
use tracing::debug;

use barge_control_plane::resources::ResourceUri;

use crate::error::{ObjectStoreSnafu, Result, StorageError};
use crate::memory::InMemoryStorageFactory;
use crate::types::QueueRequestOptions;
use crate::{ContainerClient, QueueClient, StorageClientFactory, StorageClientOptions, TableClient};

/// Factory for storage clients backed by the local file system.
pub struct LocalStorageFactory {
    root_path: PathBuf,
    options: StorageClientOptions,
    ephemeral: InMemoryStorageFactory,
}

impl LocalStorageFactory {
    pub fn new(root_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(root_path, StorageClientOptions::default())
    }

    pub fn with_options(root_path: impl AsRef<Path>, options: StorageClientOptions) -> Result<Self> {
        let canonical_path = std::fs::canonicalize(root_path.as_ref()).map_err(|source| {
            StorageError::InvalidEndpoint {
                endpoint: root_path.as_ref().display().to_string(),
                message: source.to_string(),
            }
        })?;

        Ok(Self {
            root_path: canonical_path,
            options,
            ephemeral: InMemoryStorageFactory::new(),
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// The in-memory factory serving this factory's queues and tables.
    pub fn ephemeral(&self) -> &InMemoryStorageFactory {
        &self.ephemeral
    }
}

impl StorageClientFactory for LocalStorageFactory {
    fn container_client(&self, uri: &ResourceUri) -> Result<Arc<dyn ContainerClient>> {
        let container_path = self.root_path.join(uri.name());

        std::fs::create_dir_all(&container_path).map_err(|source| {
            StorageError::InvalidEndpoint {
                endpoint: uri.to_string(),
                message: source.to_string(),
            }
        })?;

        let store =
            LocalFileSystem::new_with_prefix(&container_path).context(ObjectStoreSnafu {
                message: "failed to open container directory",
            })?;

        debug!(container = %uri, path = %container_path.display(), "opened local container");

        Ok(Arc::new(LocalContainerClient {
            store: Arc::new(store),
            options: self.options.clone(),
        }))
    }

    fn queue_client(
        &self,
        uri: &ResourceUri,
        options: Option<&QueueRequestOptions>,
    ) -> Result<Arc<dyn QueueClient>> {
        self.ephemeral.queue_client(uri, options)
    }

    fn table_client(&self, uri: &ResourceUri) -> Result<Arc<dyn TableClient>> {
        self.ephemeral.table_client(uri)
    }
}

struct LocalContainerClient {
    store: Arc<dyn ObjectStore>,
    options: StorageClientOptions,
}

#[async_trait::async_trait]
impl ContainerClient for LocalContainerClient {
    async fn upload_blob(&self, blob_name: &str, data: Bytes, _compress: bool) -> Result<()> {
        // The byte-level codec is the transport's concern; the local store
        // persists the payload as handed over.
        let location = blob_name.into();
        let put = self.store.put_opts(
            &location,
            PutPayload::from_bytes(data),
            PutOptions {
                mode: PutMode::Create,
                ..Default::default()
            },
        );

        tokio::time::timeout(self.options.upload_timeout, put)
            .await
            .map_err(|_| StorageError::Request {
                message: format!("upload of {blob_name} timed out"),
            })?
            .context(ObjectStoreSnafu {
                message: "failed to upload blob",
            })?;

        Ok(())
    }
}

/// Factory for storage clients rooted in a temporary directory.
pub struct TemporaryStorageFactory {
    _temp_dir: TempDir,
    local_factory: LocalStorageFactory,
}

impl TemporaryStorageFactory {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().map_err(|source| StorageError::InvalidEndpoint {
            endpoint: "temporary directory".to_string(),
            message: source.to_string(),
        })?;

        let local_factory = LocalStorageFactory::new(temp_dir.path())?;

        Ok(Self {
            _temp_dir: temp_dir,
            local_factory,
        })
    }

    pub fn root_path(&self) -> &Path {
        self.local_factory.root_path()
    }

    pub fn ephemeral(&self) -> &InMemoryStorageFactory {
        self.local_factory.ephemeral()
    }
}

impl StorageClientFactory for TemporaryStorageFactory {
    fn container_client(&self, uri: &ResourceUri) -> Result<Arc<dyn ContainerClient>> {
        self.local_factory.container_client(uri)
    }

    fn queue_client(
        &self,
        uri: &ResourceUri,
        options: Option<&QueueRequestOptions>,
    ) -> Result<Arc<dyn QueueClient>> {
        self.local_factory.queue_client(uri, options)
    }

    fn table_client(&self, uri: &ResourceUri) -> Result<Arc<dyn TableClient>> {
        self.local_factory.table_client(uri)
    }
}
