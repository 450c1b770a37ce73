//! In-memory implementation of the management client trait.
//!
//! This implementation serves canned responses and is suitable for testing
//! and development. Responses can be scripted per command: queued one-shot
//! results (consumed in order) take precedence over a sticky result that is
//! served repeatedly.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{CommandResponse, ManagementClient};
use crate::error::{ControlPlaneError, Result};

#[derive(Debug, Default)]
struct ScriptedResponses {
    queued: HashMap<String, VecDeque<Result<CommandResponse>>>,
    sticky: HashMap<String, CommandResponse>,
    executed: Vec<String>,
}

/// In-memory management client serving scripted responses.
#[derive(Debug, Default)]
pub struct InMemoryManagementClient {
    responses: Mutex<ScriptedResponses>,
}

impl InMemoryManagementClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for every execution of `command` (unless a queued
    /// response is pending).
    pub fn set_response(&self, command: &str, response: CommandResponse) {
        let mut responses = self.responses.lock().expect("responses lock");
        responses.sticky.insert(command.to_string(), response);
    }

    /// Queue a one-shot `response` for the next execution of `command`.
    pub fn push_response(&self, command: &str, response: Result<CommandResponse>) {
        let mut responses = self.responses.lock().expect("responses lock");
        responses
            .queued
            .entry(command.to_string())
            .or_default()
            .push_back(response);
    }

    /// How many times `command` has been executed.
    pub fn execution_count(&self, command: &str) -> usize {
        let responses = self.responses.lock().expect("responses lock");
        responses
            .executed
            .iter()
            .filter(|executed| executed.as_str() == command)
            .count()
    }
}

#[async_trait]
impl ManagementClient for InMemoryManagementClient {
    async fn execute(&self, command: &str) -> Result<CommandResponse> {
        let mut responses = self.responses.lock().expect("responses lock");
        responses.executed.push(command.to_string());

        if let Some(queued) = responses.queued.get_mut(command) {
            if let Some(response) = queued.pop_front() {
                return response;
            }
        }

        match responses.sticky.get(command) {
            Some(response) => Ok(response.clone()),
            None => Err(ControlPlaneError::Client {
                message: format!("unrecognized command: {command}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResultTable;

    fn token_response(token: &str) -> CommandResponse {
        CommandResponse::of(ResultTable::new(["AuthorizationContext"]).with_row([token]))
    }

    #[tokio::test]
    async fn test_sticky_response() {
        let client = InMemoryManagementClient::new();
        client.set_response(".get kusto identity token", token_response("token-1"));

        for _ in 0..2 {
            let response = client.execute(".get kusto identity token").await.unwrap();
            assert_eq!(
                response
                    .primary_results()
                    .and_then(|t| t.value(0, "AuthorizationContext")),
                Some("token-1")
            );
        }
        assert_eq!(client.execution_count(".get kusto identity token"), 2);
    }

    #[tokio::test]
    async fn test_queued_responses_consumed_before_sticky() {
        let client = InMemoryManagementClient::new();
        client.set_response(".get kusto identity token", token_response("sticky"));
        client.push_response(
            ".get kusto identity token",
            Err(ControlPlaneError::Throttled),
        );

        let first = client.execute(".get kusto identity token").await;
        assert!(matches!(first, Err(ControlPlaneError::Throttled)));

        let second = client.execute(".get kusto identity token").await.unwrap();
        assert_eq!(
            second
                .primary_results()
                .and_then(|t| t.value(0, "AuthorizationContext")),
            Some("sticky")
        );
    }

    #[tokio::test]
    async fn test_unrecognized_command() {
        let client = InMemoryManagementClient::new();
        let result = client.execute(".show version").await;
        assert!(matches!(result, Err(ControlPlaneError::Client { .. })));
    }
}
