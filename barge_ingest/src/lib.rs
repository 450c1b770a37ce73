//! Queued ingestion client for a managed analytics service.
//!
//! Callers hand the [`QueuedIngestClient`] a source descriptor (an uploaded
//! blob, a local file, an in-memory stream, or a tabular record set) together
//! with [`IngestionProperties`]; the client uploads the payload to
//! service-issued temporary storage, posts an ingestion notification onto a
//! service-managed queue, and optionally tracks a per-ingestion status row.
//!
//! The service issues the storage endpoints itself, with short-lived embedded
//! credentials. The [`ResourceManager`] keeps a concurrently shared cache of
//! those endpoints, spreads load across equivalent ones, and refreshes them
//! in the background.

pub mod blob_info;
pub mod client;
pub mod error;
pub mod properties;
pub mod resources;
pub mod result;
pub mod retry;
pub mod source;

pub use blob_info::IngestionBlobInfo;
pub use client::{QueuedIngestClient, EXPECTED_SERVICE_TYPE};
pub use error::{IngestError, Result};
pub use properties::{
    DataFormat, IngestionProperties, ReportLevel, ReportMethod, ValidationImplications,
    ValidationOptions, ValidationPolicy,
};
pub use resources::{
    ContainerHandle, CredentialedHandle, EndpointPool, QueueHandle, ResourceManager,
    ResourceManagerOptions, ResourceSnapshot, TableHandle,
};
pub use result::{
    IngestionResult, IngestionStatus, IngestionStatusInTableDescription, OperationStatus,
};
pub use retry::RetryPolicy;
pub use source::{
    BlobSourceInfo, CompressionType, FileSourceInfo, RecordSetSourceInfo, StreamSourceInfo,
};
