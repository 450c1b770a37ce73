//! Management command texts understood by the control plane.

/// Returns one `(ResourceTypeName, StorageRoot)` row per vended resource.
pub const INGESTION_RESOURCES_SHOW: &str = ".get ingestion resources";

/// Returns a single-row, single-column rowset holding the identity token.
pub const IDENTITY_TOKEN_GET: &str = ".get kusto identity token";

/// Returns version information, including the `ServiceType` column.
pub const VERSION_SHOW: &str = ".show version";

/// Column of the `.show version` response naming the endpoint flavor.
pub const SERVICE_TYPE_COLUMN: &str = "ServiceType";
