//! clusterboard-core - Core library for clusterboard
//!
//! Data layer for an administrative dashboard over a distributed SQL
//! cluster: a keyed remote-resource cache with request deduplication, a
//! session-scoped UI preference store, the admin API client, and the
//! process-wide state container that ties them together for the view
//! layers.

pub mod api;
pub mod cache;
pub mod error;
pub mod event;
pub mod key;
pub mod models;
pub mod preferences;
pub mod store;

pub use api::AdminApiClient;
pub use cache::{CacheEntry, FetchStatus, ResourceCache};
pub use error::TransportError;
pub use event::{DataEvent, EventBus};
pub use key::{compose_key, table_key};
pub use preferences::{PreferenceStore, SortSetting};
pub use store::{DashboardState, StateConfig};
