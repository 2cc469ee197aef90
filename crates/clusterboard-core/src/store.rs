//! Process-wide dashboard state
//!
//! A single explicit `DashboardState` instance owns one typed resource cache
//! per resource kind, the preference store, and the event bus. View layers
//! hold a shared reference and resolve everything by key at render time; no
//! ambient globals.

use crate::api::AdminApiClient;
use crate::cache::ResourceCache;
use crate::event::EventBus;
use crate::key::{compose_key, table_key};
use crate::models::{DatabaseDetails, DatabaseList, TableDetails, TableInfo, TableStats};
use crate::preferences::PreferenceStore;

/// Resource kind labels, used in events and logs
pub const KIND_DATABASES: &str = "databases";
pub const KIND_DATABASE_DETAILS: &str = "database_details";
pub const KIND_TABLE_DETAILS: &str = "table_details";
pub const KIND_TABLE_STATS: &str = "table_stats";

/// The database list is a singleton resource; it still lives in a keyed
/// cache so every kind shares one shape.
const DATABASES_KEY: &str = "databases";

/// Preference key for the grants table sort order on the table details page
pub const GRANTS_SORT_SETTING_KEY: &str = "tableDetails/sort_setting/grants";

/// Configuration for the dashboard state
#[derive(Debug, Clone)]
pub struct StateConfig {
    /// Event bus channel capacity
    pub event_capacity: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
        }
    }
}

/// Central state container for the dashboard
///
/// Caches are keyed first by resource kind (one typed field per kind), then
/// by composed request key, so each payload shape is checked at compile
/// time.
pub struct DashboardState {
    event_bus: EventBus,
    databases: ResourceCache<DatabaseList>,
    database_details: ResourceCache<DatabaseDetails>,
    table_details: ResourceCache<TableDetails>,
    table_stats: ResourceCache<TableStats>,
    preferences: PreferenceStore,
}

impl DashboardState {
    /// Create a new state container
    pub fn new(config: StateConfig) -> Self {
        let event_bus = EventBus::new(config.event_capacity);
        Self {
            databases: ResourceCache::new(KIND_DATABASES, event_bus.clone()),
            database_details: ResourceCache::new(KIND_DATABASE_DETAILS, event_bus.clone()),
            table_details: ResourceCache::new(KIND_TABLE_DETAILS, event_bus.clone()),
            table_stats: ResourceCache::new(KIND_TABLE_STATS, event_bus.clone()),
            preferences: PreferenceStore::new(event_bus.clone()),
            event_bus,
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(StateConfig::default())
    }

    /// Get the event bus for subscribing to updates
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ===================
    // Caches and preferences
    // ===================

    pub fn databases(&self) -> &ResourceCache<DatabaseList> {
        &self.databases
    }

    pub fn database_details(&self) -> &ResourceCache<DatabaseDetails> {
        &self.database_details
    }

    pub fn table_details(&self) -> &ResourceCache<TableDetails> {
        &self.table_details
    }

    pub fn table_stats(&self) -> &ResourceCache<TableStats> {
        &self.table_stats
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    // ===================
    // Fetch helpers (called by views on mount / parameter change / F5)
    // ===================

    /// Fetch the database list unless already cached or in flight
    pub fn request_databases(&self, client: &AdminApiClient) {
        let client = client.clone();
        self.databases
            .request(DATABASES_KEY, async move { client.databases().await });
    }

    /// Force-refetch the database list
    pub fn refresh_databases(&self, client: &AdminApiClient) {
        let client = client.clone();
        self.databases
            .refresh(DATABASES_KEY, async move { client.databases().await });
    }

    /// Fetch details of one database unless already cached or in flight
    pub fn request_database_details(&self, client: &AdminApiClient, database: &str) {
        let key = compose_key(&[database]);
        let client = client.clone();
        let database = database.to_string();
        self.database_details
            .request(key, async move { client.database_details(&database).await });
    }

    /// Force-refetch details of one database
    pub fn refresh_database_details(&self, client: &AdminApiClient, database: &str) {
        let key = compose_key(&[database]);
        let client = client.clone();
        let database = database.to_string();
        self.database_details
            .refresh(key, async move { client.database_details(&database).await });
    }

    /// Fetch details of one table unless already cached or in flight
    pub fn request_table_details(&self, client: &AdminApiClient, database: &str, table: &str) {
        let key = table_key(database, table);
        let client = client.clone();
        let database = database.to_string();
        let table = table.to_string();
        self.table_details.request(key, async move {
            client.table_details(&database, &table).await
        });
    }

    /// Force-refetch details of one table
    pub fn refresh_table_details(&self, client: &AdminApiClient, database: &str, table: &str) {
        let key = table_key(database, table);
        let client = client.clone();
        let database = database.to_string();
        let table = table.to_string();
        self.table_details.refresh(key, async move {
            client.table_details(&database, &table).await
        });
    }

    /// Fetch statistics of one table unless already cached or in flight
    pub fn request_table_stats(&self, client: &AdminApiClient, database: &str, table: &str) {
        let key = table_key(database, table);
        let client = client.clone();
        let database = database.to_string();
        let table = table.to_string();
        self.table_stats.request(key, async move {
            client.table_stats(&database, &table).await
        });
    }

    /// Force-refetch statistics of one table
    pub fn refresh_table_stats(&self, client: &AdminApiClient, database: &str, table: &str) {
        let key = table_key(database, table);
        let client = client.clone();
        let database = database.to_string();
        let table = table.to_string();
        self.table_stats.refresh(key, async move {
            client.table_stats(&database, &table).await
        });
    }

    // ===================
    // View models
    // ===================

    /// Combined table view model from whatever has resolved so far
    pub fn table_info(&self, database: &str, table: &str) -> TableInfo {
        let key = table_key(database, table);
        TableInfo::new(
            table,
            self.table_details.data(&key),
            self.table_stats.data(&key),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FetchStatus;
    use crate::error::TransportError;
    use crate::models::Grant;
    use crate::preferences::SortSetting;
    use std::time::Duration;
    use tokio::sync::oneshot;

    async fn wait_until(cond: impl Fn() -> bool) {
        for _ in 0..500 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("condition not reached within deadline");
    }

    fn sample_details() -> TableDetails {
        TableDetails {
            grants: vec![Grant {
                user: "root".to_string(),
                privileges: vec!["ALL".to_string()],
            }],
            create_statement: "CREATE TABLE t1 (id INT PRIMARY KEY)".to_string(),
        }
    }

    #[tokio::test]
    async fn test_state_creation() {
        let state = DashboardState::with_defaults();
        assert!(state.databases().is_empty());
        assert!(state.table_details().is_empty());
        assert!(state.preferences().is_empty());
        assert!(!state.table_info("db1", "t1").has_data());
    }

    #[tokio::test]
    async fn test_table_info_combines_details_and_stats() {
        let state = DashboardState::with_defaults();
        let key = table_key("db1", "t1");

        let details = sample_details();
        state
            .table_details()
            .request(key.clone(), async move { Ok(details) });
        wait_until(|| state.table_details().data(&key).is_some()).await;

        // Stats not resolved yet: partial view model
        let info = state.table_info("db1", "t1");
        assert!(info.has_data());
        assert_eq!(info.grants.len(), 1);
        assert!(info.size_bytes.is_none());

        let key = table_key("db1", "t1");
        state.table_stats().request(key.clone(), async move {
            Ok(TableStats {
                size_bytes: 8192,
                range_count: 2,
            })
        });
        wait_until(|| state.table_stats().data(&key).is_some()).await;

        let info = state.table_info("db1", "t1");
        assert_eq!(info.size_bytes, Some(8192));
        assert_eq!(info.range_count, Some(2));
    }

    #[tokio::test]
    async fn test_sort_preference_round_trip() {
        let state = DashboardState::with_defaults();

        let setting: SortSetting = state
            .preferences()
            .get_or_default(GRANTS_SORT_SETTING_KEY);
        assert_eq!(setting, SortSetting::default());

        let chosen = SortSetting {
            sort_key: Some("user".to_string()),
            ascending: false,
        };
        state.preferences().set(GRANTS_SORT_SETTING_KEY, &chosen);

        let read: SortSetting = state
            .preferences()
            .get_or_default(GRANTS_SORT_SETTING_KEY);
        assert_eq!(read, chosen);
    }

    // Full page lifecycle: mount fetch, render, refresh that fails, render
    // stale data alongside the error.
    #[tokio::test]
    async fn test_table_page_lifecycle() {
        let state = DashboardState::with_defaults();
        let key = table_key("db1", "t1");

        let details = sample_details();
        state
            .table_details()
            .request(key.clone(), async move { Ok(details) });
        wait_until(|| {
            state
                .table_details()
                .get(&key)
                .is_some_and(|e| e.is_succeeded())
        })
        .await;

        let entry = state.table_details().get(&key).unwrap();
        assert_eq!(entry.status, FetchStatus::Succeeded);
        assert_eq!(entry.data.unwrap().grants[0].user, "root");

        // Refresh hits a failing backend
        let (tx, rx) = oneshot::channel::<Result<TableDetails, TransportError>>();
        state
            .table_details()
            .refresh(key.clone(), async move { rx.await.unwrap() });

        // Revalidating: stale grants still render
        let entry = state.table_details().get(&key).unwrap();
        assert_eq!(entry.status, FetchStatus::Pending);
        assert_eq!(entry.data.as_ref().unwrap().grants.len(), 1);

        tx.send(Err(TransportError::Http { status: 500 })).unwrap();
        wait_until(|| {
            state
                .table_details()
                .get(&key)
                .is_some_and(|e| e.is_failed())
        })
        .await;

        let entry = state.table_details().get(&key).unwrap();
        assert_eq!(entry.error, Some(TransportError::Http { status: 500 }));
        assert_eq!(entry.data.unwrap().grants[0].user, "root");
        assert!(state.table_info("db1", "t1").has_data());
    }

    #[tokio::test]
    async fn test_resource_events_reach_state_subscribers() {
        let state = DashboardState::with_defaults();
        let mut rx = state.event_bus().subscribe();

        state
            .databases()
            .request("databases", async { Ok(DatabaseList::default()) });

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            crate::event::DataEvent::ResourceResolved { kind: KIND_DATABASES, .. }
        ));
    }
}
