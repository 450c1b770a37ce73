use std::path::PathBuf;

use snafu::Snafu;

use barge_control_plane::resources::{ResourceKind, ResourceUriError};
use barge_control_plane::{ControlPlaneError, ErrorKind};
use barge_storage::StorageError;

/// Errors surfaced by the ingest client.
///
/// The message associated with an error is forwarded to the caller, so it
/// should say what failed without leaking credentials. Use [`kind`] to tell
/// caller-attributable failures from service-attributable ones.
///
/// [`kind`]: IngestError::kind
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum IngestError {
    /// A caller-supplied argument failed validation.
    #[snafu(display("invalid {argument}: {message}"))]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },
    /// A local payload could not be read.
    #[snafu(display("failed to read source file {}", path.display()))]
    SourceFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A record set could not be materialized to CSV.
    #[snafu(display("failed to write record set as csv"))]
    RecordSetCsv { source: csv::Error },
    /// A service-issued or caller-supplied URL was malformed.
    #[snafu(display("malformed resource uri"))]
    MalformedUri { source: ResourceUriError },
    /// The ingestion message could not be serialized.
    #[snafu(display("failed to serialize ingestion message"))]
    SerializeMessage { source: serde_json::Error },
    /// A control-plane command failed after retries were exhausted.
    #[snafu(display("{operation} failed"))]
    ControlPlane {
        operation: &'static str,
        source: ControlPlaneError,
    },
    /// The control plane answered with a rowset this client cannot use.
    #[snafu(display("malformed control plane response: {message}"))]
    MalformedResponse { message: String },
    /// The pool for a resource kind is still empty after an on-demand refresh.
    #[snafu(display("unable to get ingestion resources for this type: {kind}"))]
    EmptyResourcePool { kind: ResourceKind },
    /// The identity token is still absent after an on-demand refresh.
    #[snafu(display("unable to get identity token"))]
    IdentityTokenUnavailable,
    /// The control plane vended a resource of a kind this client does not know.
    ///
    /// This aborts the refresh that saw it; the previous snapshot stays
    /// published.
    #[snafu(display("unknown resource kind in control plane response: {name}"))]
    UnknownResourceKind { name: String },
    /// A storage collaborator failed.
    #[snafu(display("{message}"))]
    Storage {
        message: &'static str,
        source: StorageError,
    },
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. }
            | Self::SourceFile { .. }
            | Self::RecordSetCsv { .. }
            | Self::MalformedUri { .. }
            | Self::SerializeMessage { .. }
            | Self::MalformedResponse { .. }
            | Self::UnknownResourceKind { .. } => ErrorKind::Client,
            Self::EmptyResourcePool { .. } | Self::IdentityTokenUnavailable => ErrorKind::Service,
            // A throttle that survived the retry policy counts as a service
            // failure once it reaches the caller.
            Self::ControlPlane { source, .. } => match source.kind() {
                ErrorKind::Client => ErrorKind::Client,
                ErrorKind::Service | ErrorKind::Throttle => ErrorKind::Service,
            },
            Self::Storage { source, .. } => source.kind(),
        }
    }
}
