//! Data source adapters
//!
//! Turns uploaded files and relational database tables into [`Dataset`]s,
//! and datasets into chart series.
//!
//! [`Dataset`]: shared_types::Dataset

pub mod chart;
pub mod database;
pub mod error;
pub mod files;

pub use chart::{build_chart, ChartRequest};
pub use database::{
    list_tables, load_table, table_label, test_connection, ConnectionParams, DatabaseEngine,
};
pub use error::DataSourceError;
pub use files::{file_label, load_file, FileKind};
