use std::fmt;

/// The kinds of ingestion resources vended by the control plane.
///
/// Each variant carries the wire name used in the `ResourceTypeName` column
/// of the `.get ingestion resources` response. The set is closed: a response
/// row with any other name is a configuration error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Queues onto which ingestion notifications are posted.
    SecuredReadyForAggregationQueue,
    /// Queues onto which the service posts failure reports.
    FailedIngestionsQueue,
    /// Queues onto which the service posts success reports.
    SuccessfulIngestionsQueue,
    /// Blob containers for transient payload uploads.
    TempStorage,
    /// Key-value table storing per-operation ingestion status.
    IngestionsStatusTable,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::SecuredReadyForAggregationQueue,
        ResourceKind::FailedIngestionsQueue,
        ResourceKind::SuccessfulIngestionsQueue,
        ResourceKind::TempStorage,
        ResourceKind::IngestionsStatusTable,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::SecuredReadyForAggregationQueue => "SecuredReadyForAggregationQueue",
            Self::FailedIngestionsQueue => "FailedIngestionsQueue",
            Self::SuccessfulIngestionsQueue => "SuccessfulIngestionsQueue",
            Self::TempStorage => "TempStorage",
            Self::IngestionsStatusTable => "IngestionsStatusTable",
        }
    }

    /// Look up a kind by its wire name, case-insensitively.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.wire_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
