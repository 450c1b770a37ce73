/// Categories of errors for classification and handling.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-attributable: bad arguments, local IO, malformed input.
    Client,

    /// Peer-attributable: the service failed or is missing resources.
    Service,

    /// Transient pushback from the control plane, retry possible.
    Throttle,
}

impl ErrorKind {
    /// Whether this error is retryable.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Throttle)
    }
}
