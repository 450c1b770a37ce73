use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::properties::{ReportLevel, ReportMethod, ValidationPolicy};
use crate::result::IngestionStatusInTableDescription;

/// The ingestion message posted onto a notification queue, serialized as
/// UTF-8 JSON with these exact wire field names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IngestionBlobInfo {
    pub blob_path: String,
    pub database_name: String,
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data_size: Option<u64>,
    pub report_level: ReportLevel,
    pub report_method: ReportMethod,
    pub flush_immediately: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_policy: Option<ValidationPolicy>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_properties: BTreeMap<String, String>,
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestion_status_in_table: Option<IngestionStatusInTableDescription>,
}

impl IngestionBlobInfo {
    pub fn new(
        blob_path: impl Into<String>,
        database_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            blob_path: blob_path.into(),
            database_name: database_name.into(),
            table_name: table_name.into(),
            raw_data_size: None,
            report_level: ReportLevel::default(),
            report_method: ReportMethod::default(),
            flush_immediately: false,
            validation_policy: None,
            additional_properties: BTreeMap::new(),
            id: Uuid::new_v4(),
            ingestion_status_in_table: None,
        }
    }
}
