use std::fmt;

use snafu::Snafu;

/// Errors that can occur when parsing a service-issued resource URL.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ResourceUriError {
    #[snafu(display("resource uri has an unsupported scheme: {uri}"))]
    UnsupportedScheme { uri: String },
    #[snafu(display("resource uri is missing its credential: {uri}"))]
    MissingCredential { uri: String },
    #[snafu(display("resource uri is missing a resource name: {uri}"))]
    MissingName { uri: String },
}

/// A service-issued storage URL split into its addressable base and the
/// SAS-style credential carried in the query string.
///
/// The control plane vends URLs of the form
/// `https://<account>.<svc>.<suffix>/<name>?<sas-query>`. The credential is
/// the raw query string without the leading `?`.
///
/// `Display` renders the secret-free base so the type is safe to log; use
/// [`full_url`](Self::full_url) when the credential is actually needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUri {
    base: String,
    sas: String,
}

impl ResourceUri {
    pub fn parse(uri: &str) -> Result<Self, ResourceUriError> {
        if !uri.starts_with("https://") && !uri.starts_with("http://") {
            return Err(ResourceUriError::UnsupportedScheme {
                uri: uri.to_string(),
            });
        }

        let Some((base, sas)) = uri.split_once('?') else {
            return Err(ResourceUriError::MissingCredential {
                uri: uri.to_string(),
            });
        };

        if sas.is_empty() {
            return Err(ResourceUriError::MissingCredential {
                uri: uri.to_string(),
            });
        }

        let uri = Self {
            base: base.trim_end_matches('/').to_string(),
            sas: sas.to_string(),
        };

        if uri.name().is_empty() {
            return Err(ResourceUriError::MissingName {
                uri: uri.base.clone(),
            });
        }

        Ok(uri)
    }

    /// The addressable endpoint without the credential.
    pub fn service_url(&self) -> &str {
        &self.base
    }

    /// The raw credential, without the leading `?`.
    pub fn sas(&self) -> &str {
        &self.sas
    }

    /// The resource name: the last path segment of the base URL.
    pub fn name(&self) -> &str {
        let after_scheme = self
            .base
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.base);
        match after_scheme.rsplit_once('/') {
            Some((_, name)) => name,
            // No path segment at all, only a host.
            None => "",
        }
    }

    /// The full authenticated URL.
    pub fn full_url(&self) -> String {
        format!("{}?{}", self.base, self.sas)
    }

    /// An authenticated URL addressing `child` under this resource.
    pub fn child_url(&self, child: &str) -> String {
        format!("{}/{}?{}", self.base, child, self.sas)
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_base_and_credential() {
        let uri = ResourceUri::parse("https://acc.queue.example.com/ready-0?sig=abc&se=later")
            .unwrap();
        assert_eq!(uri.service_url(), "https://acc.queue.example.com/ready-0");
        assert_eq!(uri.sas(), "sig=abc&se=later");
        assert_eq!(uri.name(), "ready-0");
        assert_eq!(
            uri.full_url(),
            "https://acc.queue.example.com/ready-0?sig=abc&se=later"
        );
    }

    #[test]
    fn test_child_url_reassembly() {
        let uri = ResourceUri::parse("https://acc.blob.example.com/tmp?sig=abc").unwrap();
        assert_eq!(
            uri.child_url("db__table__blob"),
            "https://acc.blob.example.com/tmp/db__table__blob?sig=abc"
        );
    }

    #[test]
    fn test_display_is_secret_free() {
        let uri = ResourceUri::parse("https://acc.blob.example.com/tmp?sig=secret").unwrap();
        assert_eq!(uri.to_string(), "https://acc.blob.example.com/tmp");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ResourceUri::parse("ftp://host/name?sas=x"),
            Err(ResourceUriError::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            ResourceUri::parse("https://host/name"),
            Err(ResourceUriError::MissingCredential { .. })
        ));
        assert!(matches!(
            ResourceUri::parse("https://host/name?"),
            Err(ResourceUriError::MissingCredential { .. })
        ));
        assert!(matches!(
            ResourceUri::parse("https://host?sas=x"),
            Err(ResourceUriError::MissingName { .. })
        ));
    }
}
