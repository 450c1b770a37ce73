//! The resource manager: a concurrent cache of service-issued endpoint
//! handles and the identity token, refreshed from the control plane.

mod handle;
mod manager;
mod pool;
mod refresh;
mod snapshot;

pub use self::handle::{ContainerHandle, CredentialedHandle, QueueHandle, TableHandle};
pub use self::manager::{ResourceManager, ResourceManagerOptions};
pub use self::pool::EndpointPool;
pub use self::snapshot::ResourceSnapshot;
