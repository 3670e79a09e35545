//! Oracle database node for workflow automation hosts
//!
//! This crate exposes Oracle database operations (execute query, insert,
//! update, delete, bulk update by primary key) to a workflow host. The host
//! supplies a [`SourceOptions`] describing the data source and a
//! [`QueryOptions`] describing the operation; the crate caches one session
//! pool per data source, assembles SQL where the operation calls for it,
//! and returns rows as JSON records. All heavy lifting is delegated to the
//! `oracle` driver crate, which requires Oracle Instant Client at runtime
//! (see [`client`]).

pub mod cache;
pub mod client;
pub mod error;
pub mod executor;
pub mod query;
pub mod source;

pub use cache::{get_pool, CacheKey, CacheMap, CloseHandle};
pub use error::Error;
pub use executor::{
    run, run_to_result, test_connection, test_connection_to_result, QueryResult, TestOutcome,
    PROBE_QUERY,
};
pub use query::{build_bulk_update_sql, parse_column_list, GuiOperation, QueryOptions, Record};
pub use source::{ClientPathType, DatabaseType, SourceOptions};
