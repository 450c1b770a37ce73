//! Background refresh loops.
//!
//! One loop per refresh kind, so the same kind never overlaps itself. The
//! first run fires immediately; after that the loop sleeps for the success
//! or failure cadence depending on how the run went. Failures are logged and
//! never escape the loop.

use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use crate::error::Result;

use super::manager::ResourceManager;

#[derive(Debug, Clone, Copy)]
enum RefreshTask {
    IngestionResources,
    IdentityToken,
}

impl RefreshTask {
    fn name(self) -> &'static str {
        match self {
            Self::IngestionResources => "refresh_ingestion_resources",
            Self::IdentityToken => "refresh_identity_token",
        }
    }

    async fn run(self, manager: &ResourceManager) -> Result<()> {
        match self {
            Self::IngestionResources => manager.refresh_ingestion_resources().await,
            Self::IdentityToken => manager.refresh_identity_token().await,
        }
    }
}

pub(super) fn spawn_refresh_loops(manager: &Arc<ResourceManager>) {
    tokio::spawn(run_refresh_loop(
        manager.clone(),
        RefreshTask::IdentityToken,
    ));
    tokio::spawn(run_refresh_loop(
        manager.clone(),
        RefreshTask::IngestionResources,
    ));
}

async fn run_refresh_loop(manager: Arc<ResourceManager>, task: RefreshTask) {
    let ct = manager.shutdown_token();
    let mut delay = Duration::ZERO;

    loop {
        tokio::select! {
            // Shutdown wins over an expired timer, so a closed manager never
            // starts another refresh.
            biased;
            _ = ct.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        delay = match task.run(&manager).await {
            Ok(()) => manager.options().refresh_interval,
            Err(err) => {
                error!(task = task.name(), error = %err, "background refresh failed");
                manager.options().failure_refresh_interval
            }
        };
    }
}
