//! Admin API client
//!
//! Thin reqwest wrapper over the backend admin endpoints. Each method
//! returns a future the resource cache can run as a fetch; the cache itself
//! stays polymorphic over the transport, this client is just the bundled
//! implementation.

use crate::error::TransportError;
use crate::models::{DatabaseDetails, DatabaseList, TableDetails, TableStats};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub use reqwest::Url;

/// Timeout applied to admin API requests when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the cluster admin API
#[derive(Debug, Clone)]
pub struct AdminApiClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl AdminApiClient {
    /// Create a client against the given base URL (e.g. `http://node:8080`)
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List all databases in the cluster
    pub async fn databases(&self) -> Result<DatabaseList, TransportError> {
        self.get_json(&["_admin", "v1", "databases"]).await
    }

    /// Tables and grants of one database
    pub async fn database_details(
        &self,
        database: &str,
    ) -> Result<DatabaseDetails, TransportError> {
        self.get_json(&["_admin", "v1", "databases", database])
            .await
    }

    /// Schema-level details of one table
    pub async fn table_details(
        &self,
        database: &str,
        table: &str,
    ) -> Result<TableDetails, TransportError> {
        self.get_json(&["_admin", "v1", "databases", database, "tables", table])
            .await
    }

    /// Storage-level statistics of one table
    pub async fn table_stats(
        &self,
        database: &str,
        table: &str,
    ) -> Result<TableStats, TransportError> {
        self.get_json(&[
            "_admin", "v1", "databases", database, "tables", table, "stats",
        ])
        .await
    }

    /// Build an endpoint URL, percent-encoding each path segment.
    ///
    /// Database and table names may contain any character; `Url` encodes
    /// them so they cannot splice extra path segments into the request.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::network("base URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<T, TransportError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "admin API request");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> AdminApiClient {
        AdminApiClient::new(Url::parse(base).unwrap())
    }

    #[test]
    fn test_endpoint_paths() {
        let client = client("http://node:8080");
        let url = client
            .endpoint(&["_admin", "v1", "databases", "db1", "tables", "users"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://node:8080/_admin/v1/databases/db1/tables/users"
        );
    }

    #[test]
    fn test_endpoint_handles_trailing_slash() {
        let client = client("http://node:8080/");
        let url = client.endpoint(&["_admin", "v1", "databases"]).unwrap();
        assert_eq!(url.as_str(), "http://node:8080/_admin/v1/databases");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("http://node:8080");
        let url = client
            .endpoint(&["_admin", "v1", "databases", "a/b c"])
            .unwrap();
        // A slash inside a name must not splice an extra path segment
        assert_eq!(url.as_str(), "http://node:8080/_admin/v1/databases/a%2Fb%20c");
    }

    #[test]
    fn test_timeout_override() {
        let client = client("http://node:8080").with_timeout(Duration::from_secs(1));
        assert_eq!(client.timeout, Duration::from_secs(1));
    }
}
