use std::sync::{Arc, Mutex};
use std::time::Duration;

use snafu::{OptionExt, ResultExt};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use barge_control_plane::resources::{ResourceKind, ResourceUri};
use barge_control_plane::{commands, ManagementClient};
use barge_storage::{QueueRequestOptions, StorageClientFactory};

use crate::error::{
    ControlPlaneSnafu, EmptyResourcePoolSnafu, IdentityTokenUnavailableSnafu,
    MalformedResponseSnafu, MalformedUriSnafu, Result, UnknownResourceKindSnafu,
};
use crate::retry::RetryPolicy;

use super::handle::{ContainerHandle, CredentialedHandle, QueueHandle, TableHandle};
use super::pool::EndpointPool;
use super::refresh;
use super::snapshot::ResourceSnapshot;

/// Cadences for the background refresh loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceManagerOptions {
    /// Delay before the next refresh after a successful one.
    pub refresh_interval: Duration,
    /// Delay before the next refresh after a failed one.
    pub failure_refresh_interval: Duration,
}

impl Default for ResourceManagerOptions {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60 * 60),
            failure_refresh_interval: Duration::from_secs(15 * 60),
        }
    }
}

/// Concurrent cache of service-issued endpoint handles and the identity
/// token.
///
/// Ingest callers take the next handle of a kind through the `get`-style
/// operations; two background loops (and, when a pool turns out empty, the
/// callers themselves) repopulate the cache from the control plane. Handles
/// of one kind are interchangeable, so selection is a deterministic round
/// robin.
///
/// The snapshot and the token refresh independently and never contend with
/// each other: each sits behind its own lock, and no operation holds both.
pub struct ResourceManager {
    client: Arc<dyn ManagementClient>,
    storage: Arc<dyn StorageClientFactory>,
    options: ResourceManagerOptions,
    retry: RetryPolicy,
    snapshot: RwLock<ResourceSnapshot>,
    identity_token: RwLock<Option<String>>,
    queue_options: Mutex<Option<QueueRequestOptions>>,
    shutdown: CancellationToken,
}

impl ResourceManager {
    /// A manager with no background refresh loops; the cache fills on demand.
    pub fn new(
        client: Arc<dyn ManagementClient>,
        storage: Arc<dyn StorageClientFactory>,
    ) -> Self {
        Self::with_options(client, storage, ResourceManagerOptions::default())
    }

    pub fn with_options(
        client: Arc<dyn ManagementClient>,
        storage: Arc<dyn StorageClientFactory>,
        options: ResourceManagerOptions,
    ) -> Self {
        Self {
            client,
            storage,
            options,
            retry: RetryPolicy::default(),
            snapshot: RwLock::new(ResourceSnapshot::empty()),
            identity_token: RwLock::new(None),
            queue_options: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    /// A manager with both refresh loops running; the first runs start
    /// immediately.
    pub fn start(
        client: Arc<dyn ManagementClient>,
        storage: Arc<dyn StorageClientFactory>,
    ) -> Arc<Self> {
        Self::start_with_options(client, storage, ResourceManagerOptions::default())
    }

    pub fn start_with_options(
        client: Arc<dyn ManagementClient>,
        storage: Arc<dyn StorageClientFactory>,
        options: ResourceManagerOptions,
    ) -> Arc<Self> {
        let manager = Arc::new(Self::with_options(client, storage, options));
        refresh::spawn_refresh_loops(&manager);
        manager
    }

    pub fn options(&self) -> &ResourceManagerOptions {
        &self.options
    }

    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancel future background refreshes. Refreshes already in flight are
    /// left to finish on their own; publication is atomic either way.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Apply `options` to queue handles constructed by future refreshes.
    /// Handles already in the cache keep the behavior they were built with.
    pub fn set_queue_request_options(&self, options: QueueRequestOptions) {
        *self.queue_options.lock().expect("queue options lock") = Some(options);
    }

    /// The next temporary-storage container handle.
    pub async fn temp_storage(&self) -> Result<ContainerHandle> {
        self.next_handle(|snapshot| &snapshot.containers).await
    }

    /// The next ingestion-notification queue handle.
    pub async fn queue(&self) -> Result<QueueHandle> {
        self.next_handle(|snapshot| &snapshot.queues).await
    }

    /// The next success-report queue handle.
    pub async fn successful_queue(&self) -> Result<QueueHandle> {
        self.next_handle(|snapshot| &snapshot.successful_queues).await
    }

    /// The next failure-report queue handle.
    pub async fn failed_queue(&self) -> Result<QueueHandle> {
        self.next_handle(|snapshot| &snapshot.failed_queues).await
    }

    /// The next status-table handle.
    pub async fn status_table(&self) -> Result<TableHandle> {
        self.next_handle(|snapshot| &snapshot.status_tables).await
    }

    /// The current identity token, refreshing on demand when absent.
    pub async fn identity_token(&self) -> Result<String> {
        {
            let token = self.identity_token.read().await;
            if let Some(token) = token.as_deref() {
                return Ok(token.to_string());
            }
        }

        self.refresh_identity_token().await?;

        let token = self.identity_token.read().await;
        match token.as_deref() {
            Some(token) => Ok(token.to_string()),
            None => IdentityTokenUnavailableSnafu.fail(),
        }
    }

    async fn next_handle<C, F>(&self, select: F) -> Result<CredentialedHandle<C>>
    where
        C: ?Sized,
        F: Fn(&ResourceSnapshot) -> &EndpointPool<C>,
    {
        {
            let snapshot = self.snapshot.read().await;
            if let Some(handle) = select(&snapshot).next() {
                return Ok(handle);
            }
        }

        self.refresh_ingestion_resources().await?;

        // If a refresh is still publishing, this read waits for it.
        let snapshot = self.snapshot.read().await;
        let pool = select(&snapshot);
        match pool.next() {
            Some(handle) => Ok(handle),
            None => EmptyResourcePoolSnafu { kind: pool.kind() }.fail(),
        }
    }

    /// Rebuild every endpoint pool from the control plane.
    ///
    /// Only one refresh runs at a time: losing the write-lock race means
    /// another refresh is in flight, and this call returns without doing
    /// anything. Redundant refreshes are worthless and not free.
    pub async fn refresh_ingestion_resources(&self) -> Result<()> {
        let Ok(mut snapshot) = self.snapshot.try_write() else {
            return Ok(());
        };

        info!("refreshing ingestion resources");
        let client = self.client.clone();
        let response = self
            .retry
            .run(|| {
                let client = client.clone();
                async move { client.execute(commands::INGESTION_RESOURCES_SHOW).await }
            })
            .await
            .context(ControlPlaneSnafu {
                operation: "refreshing ingestion resources",
            })?;

        let queue_options = self.queue_options.lock().expect("queue options lock").clone();
        let mut next = ResourceSnapshot::empty();
        if let Some(table) = response.primary_results() {
            for row in table.rows() {
                let (Some(kind_name), Some(storage_root)) = (row.first(), row.get(1)) else {
                    return MalformedResponseSnafu {
                        message: "ingestion resources row is missing a column",
                    }
                    .fail();
                };

                let kind = ResourceKind::from_wire_name(kind_name).context(
                    UnknownResourceKindSnafu {
                        name: kind_name.clone(),
                    },
                )?;
                let uri = ResourceUri::parse(storage_root).context(MalformedUriSnafu)?;
                next.add_resource(kind, uri, self.storage.as_ref(), queue_options.as_ref())?;
            }
        }

        // All five pools swap together: readers see the old snapshot until
        // this assignment, the new one after.
        *snapshot = next;
        info!("ingestion resources refreshed");
        Ok(())
    }

    /// Refresh the identity token from the control plane.
    ///
    /// Same single-flight write-lock pattern as
    /// [`refresh_ingestion_resources`](Self::refresh_ingestion_resources),
    /// under the token's own lock.
    pub async fn refresh_identity_token(&self) -> Result<()> {
        let Ok(mut token) = self.identity_token.try_write() else {
            return Ok(());
        };

        info!("refreshing identity token");
        let client = self.client.clone();
        let response = self
            .retry
            .run(|| {
                let client = client.clone();
                async move { client.execute(commands::IDENTITY_TOKEN_GET).await }
            })
            .await
            .context(ControlPlaneSnafu {
                operation: "refreshing identity token",
            })?;

        let value = response
            .primary_results()
            .and_then(|table| table.rows().first())
            .and_then(|row| row.first());
        if let Some(value) = value {
            *token = Some(value.clone());
        }

        Ok(())
    }

    /// One-shot, retry-free probe of the endpoint's service type.
    ///
    /// Used to diagnose endpoint mis-targeting after a service error; any
    /// failure here is swallowed and logged, never propagated.
    pub async fn retrieve_service_type(&self) -> Option<String> {
        info!("probing the endpoint service type");
        match self.client.execute(commands::VERSION_SHOW).await {
            Ok(response) => {
                let service_type = response
                    .primary_results()
                    .and_then(|table| table.value(0, commands::SERVICE_TYPE_COLUMN))
                    .map(str::to_string);
                if service_type.is_none() {
                    warn!("'.show version' did not return a service type");
                }
                service_type
            }
            Err(error) => {
                warn!(error = %error, "could not retrieve the endpoint service type");
                None
            }
        }
    }
}
