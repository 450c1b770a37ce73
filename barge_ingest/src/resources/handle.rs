use std::sync::Arc;

use barge_control_plane::resources::ResourceUri;
use barge_storage::{ContainerClient, QueueClient, TableClient};

/// A self-contained handle onto one service-issued storage endpoint: the
/// credentialed URL plus a typed client constructed for it.
///
/// Handles are immutable after construction and carry their own credential,
/// so a caller that extracted one keeps a usable handle even after the pool
/// it came from has been replaced by a refresh.
pub struct CredentialedHandle<C: ?Sized> {
    uri: ResourceUri,
    client: Arc<C>,
}

pub type ContainerHandle = CredentialedHandle<dyn ContainerClient>;
pub type QueueHandle = CredentialedHandle<dyn QueueClient>;
pub type TableHandle = CredentialedHandle<dyn TableClient>;

impl<C: ?Sized> CredentialedHandle<C> {
    pub fn new(uri: ResourceUri, client: Arc<C>) -> Self {
        Self { uri, client }
    }

    pub fn uri(&self) -> &ResourceUri {
        &self.uri
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }
}

// Derived Clone would demand `C: Clone`; handles only clone the Arc.
impl<C: ?Sized> Clone for CredentialedHandle<C> {
    fn clone(&self) -> Self {
        Self {
            uri: self.uri.clone(),
            client: self.client.clone(),
        }
    }
}

impl<C: ?Sized> std::fmt::Debug for CredentialedHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialedHandle")
            .field("uri", &self.uri.service_url())
            .finish_non_exhaustive()
    }
}
