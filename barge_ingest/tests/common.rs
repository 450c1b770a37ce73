use std::sync::Arc;

use barge_control_plane::{commands, CommandResponse, InMemoryManagementClient, ResultTable};
use barge_ingest::ResourceManager;
use barge_storage::InMemoryStorageFactory;

pub fn resources_response(rows: &[(&str, &str)]) -> CommandResponse {
    let mut table = ResultTable::new(["ResourceTypeName", "StorageRoot"]);
    for (kind, url) in rows {
        table.push_row([*kind, *url]);
    }
    CommandResponse::of(table)
}

pub fn token_response(token: &str) -> CommandResponse {
    CommandResponse::of(ResultTable::new(["AuthorizationContext"]).with_row([token]))
}

pub fn version_response(service_type: &str) -> CommandResponse {
    CommandResponse::of(
        ResultTable::new(["BuildVersion", "ServiceType"]).with_row(["1.0.0", service_type]),
    )
}

pub fn full_resources_rows() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "SecuredReadyForAggregationQueue",
            "https://acc.queue.example.com/ready-0?sig=rq0",
        ),
        (
            "SecuredReadyForAggregationQueue",
            "https://acc.queue.example.com/ready-1?sig=rq1",
        ),
        (
            "FailedIngestionsQueue",
            "https://acc.queue.example.com/failed-0?sig=fq0",
        ),
        (
            "SuccessfulIngestionsQueue",
            "https://acc.queue.example.com/success-0?sig=sq0",
        ),
        ("TempStorage", "https://acc.blob.example.com/tmp-0?sig=ts0"),
        (
            "IngestionsStatusTable",
            "https://acc.table.example.com/status-0?sig=st0",
        ),
    ]
}

/// A management client stubbed with a full set of resources, a token, and a
/// correctly typed endpoint.
pub fn stubbed_client() -> Arc<InMemoryManagementClient> {
    let client = InMemoryManagementClient::new();
    client.set_response(
        commands::INGESTION_RESOURCES_SHOW,
        resources_response(&full_resources_rows()),
    );
    client.set_response(commands::IDENTITY_TOKEN_GET, token_response("identity-token"));
    client.set_response(commands::VERSION_SHOW, version_response("DataManagement"));
    Arc::new(client)
}

/// A resource manager without background refresh loops, so tests control
/// every refresh.
pub fn new_manager(
    client: Arc<InMemoryManagementClient>,
) -> (Arc<ResourceManager>, Arc<InMemoryStorageFactory>) {
    let storage = Arc::new(InMemoryStorageFactory::new());
    let manager = Arc::new(ResourceManager::new(client, storage.clone()));
    (manager, storage)
}

/// Let spawned tasks make progress on the current-thread runtime.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
