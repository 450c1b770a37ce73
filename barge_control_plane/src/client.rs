use async_trait::async_trait;

use crate::error::Result;

/// Client for issuing management-style text commands against the control
/// plane of a managed analytics service.
///
/// Implementations are expected to apply their own per-request timeout; the
/// callers in this workspace handle retrying of throttled requests.
#[async_trait]
pub trait ManagementClient: Send + Sync {
    /// Execute a management command and return its rowsets.
    async fn execute(&self, command: &str) -> Result<CommandResponse>;
}

/// A single rowset of a command response: named columns over string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Rows shorter than the column list read as missing cells.
    pub fn push_row(&mut self, row: impl IntoIterator<Item = impl Into<String>>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn with_row(mut self, row: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.push_row(row);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Cell at `(row, column name)`, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }
}

/// Response to a management command: one or more rowsets, the first of which
/// holds the primary results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResponse {
    tables: Vec<ResultTable>,
}

impl CommandResponse {
    pub fn new(tables: Vec<ResultTable>) -> Self {
        Self { tables }
    }

    pub fn of(table: ResultTable) -> Self {
        Self {
            tables: vec![table],
        }
    }

    pub fn primary_results(&self) -> Option<&ResultTable> {
        self.tables.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_table_lookup() {
        let table = ResultTable::new(["ResourceTypeName", "StorageRoot"])
            .with_row(["TempStorage", "https://acc.blob.example.com/t1?sas=a"])
            .with_row(["TempStorage", "https://acc.blob.example.com/t2?sas=b"]);

        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.column_index("StorageRoot"), Some(1));
        assert_eq!(
            table.value(1, "StorageRoot"),
            Some("https://acc.blob.example.com/t2?sas=b")
        );
        assert_eq!(table.value(2, "StorageRoot"), None);
        assert_eq!(table.value(0, "MissingColumn"), None);
    }

    #[test]
    fn test_primary_results() {
        let response = CommandResponse::default();
        assert!(response.primary_results().is_none());

        let response = CommandResponse::of(ResultTable::new(["ServiceType"]).with_row(["Engine"]));
        assert_eq!(
            response.primary_results().and_then(|t| t.value(0, "ServiceType")),
            Some("Engine")
        );
    }
}
