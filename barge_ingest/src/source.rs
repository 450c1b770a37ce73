//! Source descriptors for the ingest operations.
//!
//! Every source eventually reduces to a blob: files and streams are uploaded
//! to temporary storage first, record sets are materialized to CSV and take
//! the stream path.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use snafu::{ensure, ResultExt};
use uuid::Uuid;

use crate::error::{InvalidArgumentSnafu, RecordSetCsvSnafu, Result};

/// Compression applied to a payload before it was handed over.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompressionType {
    Gz,
    Zip,
}

impl CompressionType {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gz => "gz",
            Self::Zip => "zip",
        }
    }

    /// Infer compression from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if extension.eq_ignore_ascii_case("gz") {
            Some(Self::Gz)
        } else if extension.eq_ignore_ascii_case("zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A payload already sitting in reachable blob storage.
#[derive(Debug, Clone)]
pub struct BlobSourceInfo {
    /// Full, credentialed URL of the blob.
    pub blob_path: String,
    /// Uncompressed payload size in bytes; zero means unknown.
    pub raw_size: u64,
    /// Caller-chosen ingestion id; a fresh one is assigned when absent.
    pub source_id: Option<Uuid>,
}

impl BlobSourceInfo {
    pub fn new(blob_path: impl Into<String>) -> Self {
        Self {
            blob_path: blob_path.into(),
            raw_size: 0,
            source_id: None,
        }
    }

    pub fn with_raw_size(mut self, raw_size: u64) -> Self {
        self.raw_size = raw_size;
        self
    }

    pub fn with_source_id(mut self, source_id: Uuid) -> Self {
        self.source_id = Some(source_id);
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.blob_path.is_empty(),
            InvalidArgumentSnafu {
                argument: "blob source",
                message: "blob path must not be empty",
            }
        );
        ensure!(
            self.blob_path.starts_with("https://") || self.blob_path.starts_with("http://"),
            InvalidArgumentSnafu {
                argument: "blob source",
                message: format!("blob path must be an http(s) url: {}", self.blob_path),
            }
        );
        Ok(())
    }
}

/// A payload on the local file system.
#[derive(Debug, Clone)]
pub struct FileSourceInfo {
    pub path: PathBuf,
    /// Uncompressed payload size in bytes; zero means "estimate it".
    pub raw_size: u64,
    pub source_id: Option<Uuid>,
}

impl FileSourceInfo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            raw_size: 0,
            source_id: None,
        }
    }

    pub fn with_raw_size(mut self, raw_size: u64) -> Self {
        self.raw_size = raw_size;
        self
    }

    pub fn with_source_id(mut self, source_id: Uuid) -> Self {
        self.source_id = Some(source_id);
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.path.as_os_str().is_empty(),
            InvalidArgumentSnafu {
                argument: "file source",
                message: "file path must not be empty",
            }
        );
        Ok(())
    }
}

/// An in-memory payload.
#[derive(Debug, Clone)]
pub struct StreamSourceInfo {
    pub data: Bytes,
    /// Compression the payload already carries, if any.
    pub compression: Option<CompressionType>,
    pub source_id: Option<Uuid>,
}

impl StreamSourceInfo {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            compression: None,
            source_id: None,
        }
    }

    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn with_source_id(mut self, source_id: Uuid) -> Self {
        self.source_id = Some(source_id);
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.data.is_empty(),
            InvalidArgumentSnafu {
                argument: "stream source",
                message: "the provided stream is empty",
            }
        );
        Ok(())
    }
}

/// A tabular result set of string cells.
#[derive(Debug, Clone)]
pub struct RecordSetSourceInfo {
    pub rows: Vec<Vec<String>>,
    pub source_id: Option<Uuid>,
}

impl RecordSetSourceInfo {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            source_id: None,
        }
    }

    pub fn with_source_id(mut self, source_id: Uuid) -> Self {
        self.source_id = Some(source_id);
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.rows.is_empty(),
            InvalidArgumentSnafu {
                argument: "record set source",
                message: "the record set is empty",
            }
        );
        Ok(())
    }

    /// Materialize the rows as CSV, data rows only.
    pub fn to_csv(&self) -> Result<Bytes> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        for row in &self.rows {
            writer.write_record(row).context(RecordSetCsvSnafu)?;
        }
        let data = writer
            .into_inner()
            .map_err(|error| csv::Error::from(error.into_error()))
            .context(RecordSetCsvSnafu)?;
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_from_path() {
        assert_eq!(
            CompressionType::from_path(Path::new("data.csv.gz")),
            Some(CompressionType::Gz)
        );
        assert_eq!(
            CompressionType::from_path(Path::new("archive.ZIP")),
            Some(CompressionType::Zip)
        );
        assert_eq!(CompressionType::from_path(Path::new("data.csv")), None);
        assert_eq!(CompressionType::from_path(Path::new("plain")), None);
    }

    #[test]
    fn test_blob_source_validation() {
        assert!(BlobSourceInfo::new("https://acc.blob.example.com/tmp/blob?sig=a")
            .validate()
            .is_ok());
        assert!(BlobSourceInfo::new("").validate().is_err());
        assert!(BlobSourceInfo::new("not-a-url").validate().is_err());
    }

    #[test]
    fn test_stream_source_rejects_empty_payload() {
        let source = StreamSourceInfo::new(Bytes::new());
        assert!(source.validate().is_err());

        let source = StreamSourceInfo::new(Bytes::from_static(b"1,2,3"));
        assert!(source.validate().is_ok());
    }

    #[test]
    fn test_record_set_to_csv() {
        let source = RecordSetSourceInfo::new(vec![
            vec!["1".to_string(), "alice".to_string()],
            vec!["2".to_string(), "bob,jr".to_string()],
        ]);

        let csv = source.to_csv().unwrap();
        assert_eq!(csv.as_ref(), b"1,alice\n2,\"bob,jr\"\n");
    }
}
