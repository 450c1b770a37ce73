use std::sync::Arc;

use snafu::Snafu;

use barge_control_plane::ErrorKind;

/// Errors raised by storage collaborators.
///
/// The message associated with an error is surfaced to the ingest caller, so
/// it should say which storage surface failed without leaking credentials.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum StorageError {
    /// Object store error.
    #[snafu(display("object store error: {message}"))]
    ObjectStore {
        message: &'static str,
        #[snafu(source(from(object_store::Error, Arc::new)))]
        source: Arc<object_store::Error>,
    },
    /// The credentialed URL does not address a usable storage endpoint.
    #[snafu(display("invalid storage endpoint {endpoint}: {message}"))]
    InvalidEndpoint { endpoint: String, message: String },
    /// An entity with the same keys already exists in the table.
    #[snafu(display("table entity already exists: {partition_key}/{row_key}"))]
    EntityAlreadyExists {
        partition_key: String,
        row_key: String,
    },
    /// The storage service rejected or failed the request.
    #[snafu(display("storage request failed: {message}"))]
    Request { message: String },
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEndpoint { .. } => ErrorKind::Client,
            Self::ObjectStore { .. } | Self::EntityAlreadyExists { .. } | Self::Request { .. } => {
                ErrorKind::Service
            }
        }
    }
}
