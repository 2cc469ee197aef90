//! Cluster metadata response shapes
//!
//! Minimal shapes of the backend admin API responses: just enough structure
//! to key, store, and render them. The backend owns the full wire schema.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One privilege grant on a database or table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Grant {
    pub user: String,
    pub privileges: Vec<String>,
}

impl Grant {
    /// Privileges joined for display and sorting
    pub fn privileges_joined(&self) -> String {
        self.privileges.join(", ")
    }
}

/// Schema-level details of one table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableDetails {
    pub grants: Vec<Grant>,
    pub create_statement: String,
}

/// Storage-level statistics of one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableStats {
    pub size_bytes: u64,
    pub range_count: u64,
}

/// Details of one database: its tables and grants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseDetails {
    pub table_names: Vec<String>,
    pub grants: Vec<Grant>,
}

/// Names of all databases in the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseList {
    pub databases: Vec<String>,
}

/// Combined view model for one table, assembled from whichever of the
/// details and stats responses have resolved so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub create_statement: Option<String>,
    pub grants: Vec<Grant>,
    pub size_bytes: Option<u64>,
    pub range_count: Option<u64>,
}

impl TableInfo {
    pub fn new(
        name: impl Into<String>,
        details: Option<Arc<TableDetails>>,
        stats: Option<Arc<TableStats>>,
    ) -> Self {
        Self {
            name: name.into(),
            create_statement: details.as_ref().map(|d| d.create_statement.clone()),
            grants: details.map(|d| d.grants.clone()).unwrap_or_default(),
            size_bytes: stats.as_ref().map(|s| s.size_bytes),
            range_count: stats.map(|s| s.range_count),
        }
    }

    /// True once at least one of the underlying responses has resolved
    pub fn has_data(&self) -> bool {
        self.create_statement.is_some() || self.size_bytes.is_some()
    }
}
