use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use barge_control_plane::{
    commands, CommandResponse, ControlPlaneError, ErrorKind, InMemoryManagementClient,
    ManagementClient, ResultTable,
};
use barge_ingest::{IngestError, QueuedIngestClient, ResourceManager};
use barge_storage::{InMemoryStorageFactory, QueueRequestOptions};

use common::{
    full_resources_rows, new_manager, resources_response, settle, stubbed_client, token_response,
};

mod common;

#[tokio::test]
async fn test_empty_pool_triggers_on_demand_refresh() {
    let client = Arc::new(InMemoryManagementClient::new());
    client.set_response(
        commands::INGESTION_RESOURCES_SHOW,
        resources_response(&[(
            "SecuredReadyForAggregationQueue",
            "https://a/q?sas=x",
        )]),
    );
    let (manager, _storage) = new_manager(client.clone());

    let queue = manager.queue().await.expect("queue");
    assert_eq!(queue.uri().service_url(), "https://a/q");
    assert_eq!(queue.uri().sas(), "sas=x");
    assert_eq!(client.execution_count(commands::INGESTION_RESOURCES_SHOW), 1);
}

#[tokio::test]
async fn test_populated_pools_need_no_further_refresh() {
    let client = stubbed_client();
    let (manager, _storage) = new_manager(client.clone());

    manager.refresh_ingestion_resources().await.expect("refresh");

    for _ in 0..5 {
        manager.temp_storage().await.expect("temp storage");
        manager.queue().await.expect("queue");
        manager.status_table().await.expect("status table");
        manager.failed_queue().await.expect("failed queue");
        manager.successful_queue().await.expect("successful queue");
    }

    assert_eq!(client.execution_count(commands::INGESTION_RESOURCES_SHOW), 1);
}

#[tokio::test]
async fn test_queue_selection_rotates_round_robin() {
    let client = stubbed_client();
    let (manager, _storage) = new_manager(client);

    manager.refresh_ingestion_resources().await.expect("refresh");

    // The cursor advances before reading: a two-queue pool starts at index 1.
    let names: Vec<_> = [
        manager.queue().await.expect("queue"),
        manager.queue().await.expect("queue"),
        manager.queue().await.expect("queue"),
    ]
    .iter()
    .map(|handle| handle.uri().name().to_string())
    .collect();
    assert_eq!(names, ["ready-1", "ready-0", "ready-1"]);
}

#[tokio::test(start_paused = true)]
async fn test_throttled_refresh_retries_then_succeeds() {
    let client = Arc::new(InMemoryManagementClient::new());
    for _ in 0..3 {
        client.push_response(
            commands::INGESTION_RESOURCES_SHOW,
            Err(ControlPlaneError::Throttled),
        );
    }
    client.set_response(
        commands::INGESTION_RESOURCES_SHOW,
        resources_response(&full_resources_rows()),
    );
    let (manager, _storage) = new_manager(client.clone());

    manager.refresh_ingestion_resources().await.expect("refresh");

    assert_eq!(client.execution_count(commands::INGESTION_RESOURCES_SHOW), 4);
    manager.queue().await.expect("queue");
    assert_eq!(client.execution_count(commands::INGESTION_RESOURCES_SHOW), 4);
}

#[tokio::test(start_paused = true)]
async fn test_throttled_refresh_gives_up_after_four_attempts() {
    let client = Arc::new(InMemoryManagementClient::new());
    for _ in 0..4 {
        client.push_response(
            commands::INGESTION_RESOURCES_SHOW,
            Err(ControlPlaneError::Throttled),
        );
    }
    let (manager, _storage) = new_manager(client.clone());

    let error = manager
        .refresh_ingestion_resources()
        .await
        .expect_err("refresh should fail");
    assert_eq!(error.kind(), ErrorKind::Service);
    assert_eq!(client.execution_count(commands::INGESTION_RESOURCES_SHOW), 4);
}

#[tokio::test]
async fn test_non_throttle_error_is_not_retried() {
    let client = Arc::new(InMemoryManagementClient::new());
    client.push_response(
        commands::INGESTION_RESOURCES_SHOW,
        Err(ControlPlaneError::Service {
            message: "internal error".to_string(),
        }),
    );
    let (manager, _storage) = new_manager(client.clone());

    let error = manager
        .refresh_ingestion_resources()
        .await
        .expect_err("refresh should fail");
    assert_eq!(error.kind(), ErrorKind::Service);
    assert_eq!(client.execution_count(commands::INGESTION_RESOURCES_SHOW), 1);
}

/// Management client that blocks inside `execute` until released, counting
/// invocations. Lets a test hold a refresh in flight.
struct GatedManagementClient {
    inner: Arc<InMemoryManagementClient>,
    release: watch::Receiver<bool>,
    calls: AtomicUsize,
}

#[async_trait]
impl ManagementClient for GatedManagementClient {
    async fn execute(&self, command: &str) -> Result<CommandResponse, ControlPlaneError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut release = self.release.clone();
        while !*release.borrow() {
            release.changed().await.expect("release sender dropped");
        }
        self.inner.execute(command).await
    }
}

#[tokio::test]
async fn test_concurrent_refreshes_collapse_to_one() {
    let inner = stubbed_client();
    let (release_tx, release_rx) = watch::channel(false);
    let client = Arc::new(GatedManagementClient {
        inner,
        release: release_rx,
        calls: AtomicUsize::new(0),
    });

    let storage = Arc::new(InMemoryStorageFactory::new());
    let manager = Arc::new(ResourceManager::new(client.clone(), storage));

    let completed = Arc::new(AtomicUsize::new(0));
    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let manager = manager.clone();
            let completed = completed.clone();
            tokio::spawn(async move {
                manager
                    .refresh_ingestion_resources()
                    .await
                    .expect("refresh");
                completed.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    settle().await;

    // One refresh holds the write lock inside the control-plane call; the
    // other nine lost the try-lock race and returned immediately.
    assert_eq!(completed.load(Ordering::SeqCst), 9);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);

    release_tx.send(true).expect("release");
    for task in tasks {
        task.await.expect("task");
    }

    assert_eq!(completed.load(Ordering::SeqCst), 10);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    manager.queue().await.expect("queue");
}

#[tokio::test]
async fn test_unknown_resource_kind_keeps_previous_snapshot() {
    let client = stubbed_client();
    let (manager, _storage) = new_manager(client.clone());

    manager.refresh_ingestion_resources().await.expect("refresh");

    client.push_response(
        commands::INGESTION_RESOURCES_SHOW,
        Ok(resources_response(&[(
            "MysteryQueue",
            "https://acc.queue.example.com/mystery?sig=mq",
        )])),
    );
    let error = manager
        .refresh_ingestion_resources()
        .await
        .expect_err("refresh should fail");
    assert!(matches!(error, IngestError::UnknownResourceKind { .. }));

    // The failed refresh published nothing; the previous snapshot serves.
    let queue = manager.queue().await.expect("queue");
    assert!(queue.uri().name().starts_with("ready-"));
    assert_eq!(client.execution_count(commands::INGESTION_RESOURCES_SHOW), 2);
}

#[tokio::test]
async fn test_identity_token_refreshes_independently_of_resources() {
    let client = Arc::new(InMemoryManagementClient::new());
    client.set_response(commands::IDENTITY_TOKEN_GET, token_response("identity-token"));
    client.push_response(
        commands::INGESTION_RESOURCES_SHOW,
        Err(ControlPlaneError::Service {
            message: "resources unavailable".to_string(),
        }),
    );
    let (manager, _storage) = new_manager(client);

    let token = manager.identity_token().await.expect("token");
    assert_eq!(token, "identity-token");

    let error = manager.queue().await.expect_err("queue should fail");
    assert_eq!(error.kind(), ErrorKind::Service);
}

#[tokio::test]
async fn test_identity_token_unavailable_after_empty_response() {
    let client = Arc::new(InMemoryManagementClient::new());
    client.set_response(
        commands::IDENTITY_TOKEN_GET,
        CommandResponse::of(ResultTable::new(["AuthorizationContext"])),
    );
    let (manager, _storage) = new_manager(client);

    let error = manager.identity_token().await.expect_err("token");
    assert!(matches!(error, IngestError::IdentityTokenUnavailable));
    assert_eq!(error.kind(), ErrorKind::Service);
}

#[tokio::test]
async fn test_identity_token_is_cached() {
    let client = stubbed_client();
    let (manager, _storage) = new_manager(client.clone());

    for _ in 0..3 {
        let token = manager.identity_token().await.expect("token");
        assert_eq!(token, "identity-token");
    }
    assert_eq!(client.execution_count(commands::IDENTITY_TOKEN_GET), 1);
}

#[tokio::test]
async fn test_queue_request_options_apply_to_future_refreshes() {
    let client = stubbed_client();
    let (manager, storage) = new_manager(client);

    manager.refresh_ingestion_resources().await.expect("refresh");
    assert_eq!(storage.last_queue_options(), None);

    let options = QueueRequestOptions::default();
    manager.set_queue_request_options(options.clone());
    manager.refresh_ingestion_resources().await.expect("refresh");
    assert_eq!(storage.last_queue_options(), Some(options));
}

#[tokio::test]
async fn test_retrieve_service_type() {
    let client = stubbed_client();
    let (manager, _storage) = new_manager(client);
    assert_eq!(
        manager.retrieve_service_type().await.as_deref(),
        Some("DataManagement")
    );

    let failing = Arc::new(InMemoryManagementClient::new());
    let (manager, _storage) = new_manager(failing);
    assert_eq!(manager.retrieve_service_type().await, None);

    let empty = Arc::new(InMemoryManagementClient::new());
    empty.set_response(
        commands::VERSION_SHOW,
        CommandResponse::of(ResultTable::new(["BuildVersion", "ServiceType"])),
    );
    let (manager, _storage) = new_manager(empty);
    assert_eq!(manager.retrieve_service_type().await, None);
}

#[tokio::test]
async fn test_client_close_stops_the_resource_manager() {
    let client = stubbed_client();
    let storage = Arc::new(InMemoryStorageFactory::new());
    let manager = Arc::new(ResourceManager::new(client, storage));
    let ingest = QueuedIngestClient::from_resource_manager(manager.clone());

    ingest.close();
    assert!(manager.is_closed());
}
