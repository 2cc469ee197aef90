//! Data models for clusterboard-core

mod cluster;

pub use cluster::{
    DatabaseDetails, DatabaseList, Grant, TableDetails, TableInfo, TableStats,
};
