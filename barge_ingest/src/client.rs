//! The queued ingest façade.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use snafu::ResultExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use barge_control_plane::{ErrorKind, ManagementClient};
use barge_storage::{StorageClientFactory, TableEntity};

use crate::blob_info::IngestionBlobInfo;
use crate::error::{Result, SerializeMessageSnafu, SourceFileSnafu, StorageSnafu};
use crate::properties::{DataFormat, IngestionProperties, ReportLevel, ReportMethod};
use crate::resources::{ResourceManager, ResourceManagerOptions};
use crate::result::{
    IngestionResult, IngestionStatus, IngestionStatusInTableDescription, OperationStatus,
};
use crate::source::{
    BlobSourceInfo, CompressionType, FileSourceInfo, RecordSetSourceInfo, StreamSourceInfo,
};

/// Service type of a correctly targeted queued-ingestion endpoint.
pub const EXPECTED_SERVICE_TYPE: &str = "DataManagement";

const INGEST_PREFIX: &str = "ingest-";
const PROTOCOL_SEPARATOR: &str = "://";
const STREAM_UPLOAD_BASENAME: &str = "StreamUpload";
const AUTHORIZATION_CONTEXT_KEY: &str = "authorizationContext";

/// Rough ratio of raw to compressed size, for estimating the raw size of
/// payloads that arrive compressed.
const COMPRESSED_FILE_MULTIPLIER: u64 = 11;

/// Client that ingests by uploading payloads to service-issued temporary
/// storage and posting notifications onto service-managed queues.
///
/// Every source reduces to a blob: [`ingest_from_file`] and
/// [`ingest_from_stream`] upload first, [`ingest_from_record_set`]
/// materializes to CSV and takes the stream path.
///
/// [`ingest_from_file`]: Self::ingest_from_file
/// [`ingest_from_stream`]: Self::ingest_from_stream
/// [`ingest_from_record_set`]: Self::ingest_from_record_set
pub struct QueuedIngestClient {
    resource_manager: Arc<ResourceManager>,
    connection_data_source: Option<String>,
}

impl QueuedIngestClient {
    pub fn new(
        client: Arc<dyn ManagementClient>,
        storage: Arc<dyn StorageClientFactory>,
    ) -> Self {
        Self::with_options(client, storage, ResourceManagerOptions::default())
    }

    pub fn with_options(
        client: Arc<dyn ManagementClient>,
        storage: Arc<dyn StorageClientFactory>,
        options: ResourceManagerOptions,
    ) -> Self {
        info!("creating a new queued ingest client");
        Self::from_resource_manager(ResourceManager::start_with_options(
            client, storage, options,
        ))
    }

    /// Wrap an existing resource manager.
    pub fn from_resource_manager(resource_manager: Arc<ResourceManager>) -> Self {
        Self {
            resource_manager,
            connection_data_source: None,
        }
    }

    /// Record the cluster URL this client was pointed at, enabling the
    /// corrected-endpoint suggestion after a service error.
    pub fn with_connection_data_source(mut self, source: impl Into<String>) -> Self {
        self.connection_data_source = Some(source.into());
        self
    }

    pub fn resource_manager(&self) -> &Arc<ResourceManager> {
        &self.resource_manager
    }

    /// Stop background refreshes. In-flight work finishes on its own.
    pub fn close(&self) {
        self.resource_manager.close();
    }

    /// Ingest a payload already sitting in reachable blob storage.
    pub async fn ingest_from_blob(
        &self,
        source: BlobSourceInfo,
        properties: &IngestionProperties,
    ) -> Result<IngestionResult> {
        source.validate()?;
        properties.validate()?;

        let result = self.ingest_blob_unchecked(source, properties).await;
        self.with_service_diagnosis(result).await
    }

    /// Upload a local file to temporary storage and ingest it.
    pub async fn ingest_from_file(
        &self,
        source: FileSourceInfo,
        properties: &IngestionProperties,
    ) -> Result<IngestionResult> {
        source.validate()?;
        properties.validate()?;

        let result = self.ingest_file_inner(source, properties).await;
        self.with_service_diagnosis(result).await
    }

    /// Upload an in-memory payload to temporary storage and ingest it.
    pub async fn ingest_from_stream(
        &self,
        source: StreamSourceInfo,
        properties: &IngestionProperties,
    ) -> Result<IngestionResult> {
        source.validate()?;
        properties.validate()?;

        let result = self.ingest_stream_inner(source, properties).await;
        self.with_service_diagnosis(result).await
    }

    /// Materialize a tabular record set to CSV and ingest it.
    pub async fn ingest_from_record_set(
        &self,
        source: RecordSetSourceInfo,
        properties: &IngestionProperties,
    ) -> Result<IngestionResult> {
        source.validate()?;
        properties.validate_for_record_set()?;

        let stream = StreamSourceInfo {
            data: source.to_csv()?,
            compression: None,
            source_id: source.source_id,
        };

        let result = self.ingest_stream_inner(stream, properties).await;
        self.with_service_diagnosis(result).await
    }

    /// The blob primitive every other source reduces to.
    async fn ingest_blob_unchecked(
        &self,
        source: BlobSourceInfo,
        properties: &IngestionProperties,
    ) -> Result<IngestionResult> {
        let authorization_context = self.resource_manager.identity_token().await?;

        let mut blob_info = IngestionBlobInfo::new(
            &source.blob_path,
            &properties.database,
            &properties.table,
        );
        let safe_path = strip_secrets(&source.blob_path).to_string();

        if source.raw_size > 0 {
            blob_info.raw_data_size = Some(source.raw_size);
        } else {
            warn!(
                blob = %safe_path,
                "blob sent for ingestion without a raw data size hint"
            );
        }

        blob_info.report_level = properties.report_level;
        blob_info.report_method = properties.report_method;
        blob_info.flush_immediately = properties.flush_immediately;
        blob_info.validation_policy = properties.validation_policy;
        blob_info.additional_properties = properties.additional_properties.clone();
        blob_info.additional_properties.insert(
            AUTHORIZATION_CONTEXT_KEY.to_string(),
            authorization_context,
        );
        if let Some(source_id) = source.source_id {
            blob_info.id = source_id;
        }

        let mut status = IngestionStatus {
            database: properties.database.clone(),
            table: properties.table.clone(),
            status: OperationStatus::Queued,
            updated_on: Utc::now(),
            ingestion_source_id: blob_info.id,
            ingestion_source_path: safe_path,
        };

        let report_to_table = properties.report_level != ReportLevel::None
            && properties.report_method != ReportMethod::Queue;

        let mut table_statuses = Vec::new();
        if report_to_table {
            status.status = OperationStatus::Pending;

            let status_table = self.resource_manager.status_table().await?;
            let key = blob_info.id.to_string();
            let in_table = IngestionStatusInTableDescription {
                table_connection_string: status_table.uri().full_url(),
                partition_key: key.clone(),
                row_key: key.clone(),
            };
            blob_info.ingestion_status_in_table = Some(in_table.clone());

            let entity =
                TableEntity::new(key.clone(), key).with_properties(status.entity_properties());
            status_table
                .client()
                .insert_entity(entity)
                .await
                .context(StorageSnafu {
                    message: "failed to record the pending ingestion status",
                })?;
            table_statuses.push(in_table);
        }

        let message = serde_json::to_string(&blob_info).context(SerializeMessageSnafu)?;

        let queue = self.resource_manager.queue().await?;
        debug!(
            queue = %queue.uri(),
            blob = %status.ingestion_source_path,
            "posting ingestion notification"
        );
        queue
            .client()
            .post_message(&message)
            .await
            .context(StorageSnafu {
                message: "failed to post the ingestion notification",
            })?;

        if report_to_table {
            Ok(IngestionResult::TableReport(table_statuses))
        } else {
            Ok(IngestionResult::Queued(status))
        }
    }

    async fn ingest_file_inner(
        &self,
        source: FileSourceInfo,
        properties: &IngestionProperties,
    ) -> Result<IngestionResult> {
        let data = tokio::fs::read(&source.path)
            .await
            .context(SourceFileSnafu {
                path: source.path.clone(),
            })?;
        let data_len = data.len() as u64;

        let source_compression = CompressionType::from_path(&source.path);
        let compress = should_compress(source_compression, properties.data_format);

        let basename = source
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(STREAM_UPLOAD_BASENAME);
        let blob_name = gen_blob_name(
            basename,
            &properties.database,
            &properties.table,
            properties.data_format,
            if compress {
                Some(CompressionType::Gz)
            } else {
                source_compression
            },
        );

        let container = self.resource_manager.temp_storage().await?;
        container
            .client()
            .upload_blob(&blob_name, Bytes::from(data), compress)
            .await
            .context(StorageSnafu {
                message: "failed to upload the source file",
            })?;

        let raw_size = if source.raw_size > 0 {
            source.raw_size
        } else {
            estimate_raw_size(
                data_len,
                properties.data_format.is_compressible(),
                source_compression,
            )
        };

        let blob_source = BlobSourceInfo {
            blob_path: container.uri().child_url(&blob_name),
            raw_size,
            source_id: source.source_id,
        };
        self.ingest_blob_unchecked(blob_source, properties).await
    }

    async fn ingest_stream_inner(
        &self,
        source: StreamSourceInfo,
        properties: &IngestionProperties,
    ) -> Result<IngestionResult> {
        let compress = should_compress(source.compression, properties.data_format);
        let blob_name = gen_blob_name(
            STREAM_UPLOAD_BASENAME,
            &properties.database,
            &properties.table,
            properties.data_format,
            if compress {
                Some(CompressionType::Gz)
            } else {
                source.compression
            },
        );

        let container = self.resource_manager.temp_storage().await?;
        container
            .client()
            .upload_blob(&blob_name, source.data, compress)
            .await
            .context(StorageSnafu {
                message: "failed to upload the source stream",
            })?;

        let blob_source = BlobSourceInfo {
            blob_path: container.uri().child_url(&blob_name),
            // The raw size of a stream is not known locally.
            raw_size: 0,
            source_id: source.source_id,
        };
        self.ingest_blob_unchecked(blob_source, properties).await
    }

    /// On a service error, probe the endpoint's service type to tell apart
    /// "the service failed" from "this is not an ingestion endpoint". The
    /// original error is surfaced either way.
    async fn with_service_diagnosis<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(error) = &result {
            if error.kind() == ErrorKind::Service {
                self.diagnose_endpoint_service_type().await;
            }
        }
        result
    }

    async fn diagnose_endpoint_service_type(&self) {
        let Some(service_type) = self.resource_manager.retrieve_service_type().await else {
            return;
        };
        if service_type == EXPECTED_SERVICE_TYPE {
            return;
        }

        match &self.connection_data_source {
            Some(source) => warn!(
                service_type = %service_type,
                expected = EXPECTED_SERVICE_TYPE,
                suggested = %ingestion_endpoint(source),
                "endpoint is not a data management endpoint; retry against the suggested endpoint"
            ),
            None => warn!(
                service_type = %service_type,
                expected = EXPECTED_SERVICE_TYPE,
                "endpoint is not a data management endpoint"
            ),
        }
    }
}

/// The ingestion (data management) flavor of a cluster URL.
pub fn ingestion_endpoint(cluster_url: &str) -> String {
    if cluster_url.contains(INGEST_PREFIX) {
        cluster_url.to_string()
    } else {
        cluster_url.replacen(
            PROTOCOL_SEPARATOR,
            &format!("{PROTOCOL_SEPARATOR}{INGEST_PREFIX}"),
            1,
        )
    }
}

/// The query (engine) flavor of a cluster URL.
pub fn query_endpoint(cluster_url: &str) -> String {
    if cluster_url.contains(INGEST_PREFIX) {
        cluster_url.replacen(INGEST_PREFIX, "", 1)
    } else {
        cluster_url.to_string()
    }
}

fn strip_secrets(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}

fn should_compress(
    source_compression: Option<CompressionType>,
    data_format: DataFormat,
) -> bool {
    source_compression.is_none() && data_format.is_compressible()
}

fn estimate_raw_size(
    file_size: u64,
    compressible: bool,
    source_compression: Option<CompressionType>,
) -> u64 {
    if source_compression.is_some() || !compressible {
        file_size * COMPRESSED_FILE_MULTIPLIER
    } else {
        file_size
    }
}

fn gen_blob_name(
    file_name: &str,
    database: &str,
    table: &str,
    data_format: DataFormat,
    compression: Option<CompressionType>,
) -> String {
    let base = remove_extension(file_name);
    let mut name = format!(
        "{database}__{table}__{base}__{}.{}",
        Uuid::new_v4(),
        data_format.wire_name()
    );
    if let Some(compression) = compression {
        name.push('.');
        name.push_str(compression.extension());
    }
    name
}

fn remove_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}
