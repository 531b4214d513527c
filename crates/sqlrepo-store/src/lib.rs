//! sqlrepo store - SQLite persistence
//!
//! Provides:
//! - Connection opening and pragmas from a `StoreConfig`
//! - DDL generation and the `_sqlrepo_entities` registry table
//! - Synchronous table operations (`SqliteTables`)
//! - `SqliteStore`, the async `Store` implementation over one connection

pub mod config;
pub mod db;
pub mod errors;
pub mod schema;
pub mod sqlite_store;
pub mod tables;

pub use config::{JournalMode, StoreConfig};
pub use errors::Result;
pub use sqlite_store::SqliteStore;
pub use tables::SqliteTables;
