use snafu::ResultExt;

use barge_control_plane::resources::{ResourceKind, ResourceUri};
use barge_storage::{
    ContainerClient, QueueClient, QueueRequestOptions, StorageClientFactory, TableClient,
};

use crate::error::{Result, StorageSnafu};

use super::handle::CredentialedHandle;
use super::pool::EndpointPool;

/// The atomic unit of refresh: one endpoint pool per resource kind.
///
/// A snapshot is built completely off to the side and published by wholesale
/// assignment under the write lock, so readers observe either the previous
/// snapshot or the new one, never a mix. A refresh that fails midway leaves
/// the previous snapshot in place.
pub struct ResourceSnapshot {
    pub(crate) containers: EndpointPool<dyn ContainerClient>,
    pub(crate) queues: EndpointPool<dyn QueueClient>,
    pub(crate) successful_queues: EndpointPool<dyn QueueClient>,
    pub(crate) failed_queues: EndpointPool<dyn QueueClient>,
    pub(crate) status_tables: EndpointPool<dyn TableClient>,
}

impl ResourceSnapshot {
    /// The zeroth, pre-refresh snapshot: every pool empty.
    pub fn empty() -> Self {
        Self {
            containers: EndpointPool::new(ResourceKind::TempStorage),
            queues: EndpointPool::new(ResourceKind::SecuredReadyForAggregationQueue),
            successful_queues: EndpointPool::new(ResourceKind::SuccessfulIngestionsQueue),
            failed_queues: EndpointPool::new(ResourceKind::FailedIngestionsQueue),
            status_tables: EndpointPool::new(ResourceKind::IngestionsStatusTable),
        }
    }

    /// Construct a typed handle for `uri` and append it to the pool for
    /// `kind`.
    pub(crate) fn add_resource(
        &mut self,
        kind: ResourceKind,
        uri: ResourceUri,
        storage: &dyn StorageClientFactory,
        queue_options: Option<&QueueRequestOptions>,
    ) -> Result<()> {
        match kind {
            ResourceKind::TempStorage => {
                let client = storage.container_client(&uri).context(StorageSnafu {
                    message: "failed to construct container client",
                })?;
                self.containers.add(CredentialedHandle::new(uri, client));
            }
            ResourceKind::SecuredReadyForAggregationQueue => {
                let client = storage
                    .queue_client(&uri, queue_options)
                    .context(StorageSnafu {
                        message: "failed to construct queue client",
                    })?;
                self.queues.add(CredentialedHandle::new(uri, client));
            }
            ResourceKind::SuccessfulIngestionsQueue => {
                let client = storage
                    .queue_client(&uri, queue_options)
                    .context(StorageSnafu {
                        message: "failed to construct queue client",
                    })?;
                self.successful_queues
                    .add(CredentialedHandle::new(uri, client));
            }
            ResourceKind::FailedIngestionsQueue => {
                let client = storage
                    .queue_client(&uri, queue_options)
                    .context(StorageSnafu {
                        message: "failed to construct queue client",
                    })?;
                self.failed_queues.add(CredentialedHandle::new(uri, client));
            }
            ResourceKind::IngestionsStatusTable => {
                let client = storage.table_client(&uri).context(StorageSnafu {
                    message: "failed to construct table client",
                })?;
                self.status_tables.add(CredentialedHandle::new(uri, client));
            }
        }

        Ok(())
    }
}
