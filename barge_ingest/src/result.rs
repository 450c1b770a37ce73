use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Where one ingestion stands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum OperationStatus {
    /// Queued and pending service-side execution; progress is tracked in the
    /// status table.
    Pending,
    /// Queued; the service will not report further progress here.
    Queued,
    Succeeded,
    Failed,
    PartiallySucceeded,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "Pending",
            Self::Queued => "Queued",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::PartiallySucceeded => "PartiallySucceeded",
        };
        f.write_str(name)
    }
}

/// A point-in-time record of one ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionStatus {
    pub database: String,
    pub table: String,
    pub status: OperationStatus,
    pub updated_on: DateTime<Utc>,
    pub ingestion_source_id: Uuid,
    /// Secret-free path of the ingested payload.
    pub ingestion_source_path: String,
}

impl IngestionStatus {
    /// The status-table rendering of this record.
    pub fn entity_properties(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("Database".to_string(), self.database.clone()),
            ("Table".to_string(), self.table.clone()),
            ("Status".to_string(), self.status.to_string()),
            ("UpdatedOn".to_string(), self.updated_on.to_rfc3339()),
            (
                "IngestionSourceId".to_string(),
                self.ingestion_source_id.to_string(),
            ),
            (
                "IngestionSourcePath".to_string(),
                self.ingestion_source_path.clone(),
            ),
        ])
    }
}

/// Reference to the status-table row tracking one ingestion, as carried on
/// the ingestion message and returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IngestionStatusInTableDescription {
    pub table_connection_string: String,
    pub partition_key: String,
    pub row_key: String,
}

/// Outcome of a successful ingest call.
#[derive(Debug, Clone)]
pub enum IngestionResult {
    /// The notification was queued; this in-memory status is all there is.
    Queued(IngestionStatus),
    /// A status row was inserted; poll these references for progress.
    TableReport(Vec<IngestionStatusInTableDescription>),
}
