use snafu::Snafu;

use crate::error_kind::ErrorKind;

/// Errors returned by a [`ManagementClient`](crate::client::ManagementClient).
///
/// Throttling is modeled as its own variant so callers can retry it locally
/// without inspecting messages; all other failures are tagged by origin.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum ControlPlaneError {
    /// The control plane asked the client to back off.
    #[snafu(display("request throttled by the control plane"))]
    Throttled,
    /// The control plane failed to execute the command.
    #[snafu(display("control plane service error: {message}"))]
    Service { message: String },
    /// The command never made it to the control plane in a valid form.
    #[snafu(display("control plane client error: {message}"))]
    Client { message: String },
}

pub type Result<T, E = ControlPlaneError> = std::result::Result<T, E>;

impl ControlPlaneError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Throttled => ErrorKind::Throttle,
            Self::Service { .. } => ErrorKind::Service,
            Self::Client { .. } => ErrorKind::Client,
        }
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled)
    }
}
