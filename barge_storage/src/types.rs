use std::collections::BTreeMap;
use std::time::Duration;

/// An entity destined for a key-value status table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntity {
    pub partition_key: String,
    pub row_key: String,
    pub properties: BTreeMap<String, String>,
}

impl TableEntity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }
}

/// Retry and timeout hints applied to queue clients.
///
/// These only affect clients constructed after the options are set; clients
/// already handed out keep the behavior they were built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRequestOptions {
    pub max_tries: u32,
    pub try_timeout: Duration,
}

impl Default for QueueRequestOptions {
    fn default() -> Self {
        Self {
            max_tries: 3,
            try_timeout: Duration::from_secs(30),
        }
    }
}
