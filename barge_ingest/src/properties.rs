use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use snafu::ensure;

use crate::error::{InvalidArgumentSnafu, Result};

/// Format of the payload being ingested.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum DataFormat {
    #[default]
    Csv,
    Tsv,
    Json,
    MultiJson,
    Avro,
    Orc,
    Parquet,
}

impl DataFormat {
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
            Self::MultiJson => "multijson",
            Self::Avro => "avro",
            Self::Orc => "orc",
            Self::Parquet => "parquet",
        }
    }

    /// Whether compressing the payload is worthwhile. The binary formats
    /// carry their own compression.
    pub fn is_compressible(self) -> bool {
        !matches!(self, Self::Avro | Self::Orc | Self::Parquet)
    }
}

/// Which ingestion outcomes the service should report.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ReportLevel {
    #[default]
    FailuresOnly,
    None,
    FailuresAndSuccesses,
}

impl ReportLevel {
    pub fn wire_value(self) -> u8 {
        match self {
            Self::FailuresOnly => 0,
            Self::None => 1,
            Self::FailuresAndSuccesses => 2,
        }
    }
}

impl Serialize for ReportLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.wire_value())
    }
}

/// Where the service should report ingestion outcomes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ReportMethod {
    #[default]
    Queue,
    Table,
}

impl ReportMethod {
    pub fn wire_value(self) -> u8 {
        match self {
            Self::Queue => 0,
            Self::Table => 1,
        }
    }
}

impl Serialize for ReportMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.wire_value())
    }
}

/// What the service should validate about the payload before ingesting it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValidationOptions {
    DoNotValidate,
    ValidateCsvInputConstantColumns,
    ValidateCsvInputColumnLevelOnly,
}

impl ValidationOptions {
    pub fn wire_value(self) -> u8 {
        match self {
            Self::DoNotValidate => 0,
            Self::ValidateCsvInputConstantColumns => 1,
            Self::ValidateCsvInputColumnLevelOnly => 2,
        }
    }
}

impl Serialize for ValidationOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.wire_value())
    }
}

/// What the service should do when validation fails.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValidationImplications {
    Fail,
    BestEffort,
}

impl ValidationImplications {
    pub fn wire_value(self) -> u8 {
        match self {
            Self::Fail => 0,
            Self::BestEffort => 1,
        }
    }
}

impl Serialize for ValidationImplications {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.wire_value())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationPolicy {
    #[serde(rename = "ValidationOptions")]
    pub options: ValidationOptions,
    #[serde(rename = "ValidationImplications")]
    pub implications: ValidationImplications,
}

/// Per-ingestion settings: the target table, the payload format, and how the
/// outcome should be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionProperties {
    pub database: String,
    pub table: String,
    pub data_format: DataFormat,
    pub report_level: ReportLevel,
    pub report_method: ReportMethod,
    pub flush_immediately: bool,
    pub validation_policy: Option<ValidationPolicy>,
    /// Extra properties forwarded verbatim on the ingestion message.
    pub additional_properties: BTreeMap<String, String>,
}

impl IngestionProperties {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            data_format: DataFormat::default(),
            report_level: ReportLevel::default(),
            report_method: ReportMethod::default(),
            flush_immediately: false,
            validation_policy: None,
            additional_properties: BTreeMap::new(),
        }
    }

    pub fn with_data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }

    pub fn with_report_level(mut self, report_level: ReportLevel) -> Self {
        self.report_level = report_level;
        self
    }

    pub fn with_report_method(mut self, report_method: ReportMethod) -> Self {
        self.report_method = report_method;
        self
    }

    pub fn with_flush_immediately(mut self, flush_immediately: bool) -> Self {
        self.flush_immediately = flush_immediately;
        self
    }

    pub fn with_validation_policy(mut self, validation_policy: ValidationPolicy) -> Self {
        self.validation_policy = Some(validation_policy);
        self
    }

    pub fn with_additional_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.additional_properties.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.database.is_empty(),
            InvalidArgumentSnafu {
                argument: "ingestion properties",
                message: "database name must not be empty",
            }
        );
        ensure!(
            !self.table.is_empty(),
            InvalidArgumentSnafu {
                argument: "ingestion properties",
                message: "table name must not be empty",
            }
        );
        Ok(())
    }

    /// Record-set ingestion materializes to CSV, so the format must agree.
    pub fn validate_for_record_set(&self) -> Result<()> {
        self.validate()?;
        ensure!(
            self.data_format == DataFormat::Csv,
            InvalidArgumentSnafu {
                argument: "ingestion properties",
                message: format!(
                    "record set ingestion requires the csv data format, got {}",
                    self.data_format.wire_name()
                ),
            }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_database_and_table() {
        assert!(IngestionProperties::new("db", "events").validate().is_ok());
        assert!(IngestionProperties::new("", "events").validate().is_err());
        assert!(IngestionProperties::new("db", "").validate().is_err());
    }

    #[test]
    fn test_record_set_requires_csv() {
        let properties =
            IngestionProperties::new("db", "events").with_data_format(DataFormat::Parquet);
        assert!(properties.validate().is_ok());
        assert!(properties.validate_for_record_set().is_err());

        let properties = IngestionProperties::new("db", "events");
        assert!(properties.validate_for_record_set().is_ok());
    }

    #[test]
    fn test_binary_formats_are_not_compressible() {
        assert!(DataFormat::Csv.is_compressible());
        assert!(DataFormat::Json.is_compressible());
        assert!(!DataFormat::Parquet.is_compressible());
        assert!(!DataFormat::Avro.is_compressible());
        assert!(!DataFormat::Orc.is_compressible());
    }

    #[test]
    fn test_report_wire_values() {
        assert_eq!(ReportLevel::FailuresOnly.wire_value(), 0);
        assert_eq!(ReportLevel::None.wire_value(), 1);
        assert_eq!(ReportLevel::FailuresAndSuccesses.wire_value(), 2);
        assert_eq!(ReportMethod::Queue.wire_value(), 0);
        assert_eq!(ReportMethod::Table.wire_value(), 1);
    }
}
