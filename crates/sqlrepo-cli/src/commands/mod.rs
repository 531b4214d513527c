pub mod query;
pub mod tables;

use rusqlite::Connection;
use sqlrepo_store::{db, schema};
use std::path::Path;

/// Open an existing sqlrepo database for reading
///
/// Files without an entity registry are rejected rather than initialised.
pub(crate) fn open_existing(path: &str) -> Result<Connection, Box<dyn std::error::Error>> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(format!("Database not found: {}", path.display()).into());
    }
    let conn = db::open_read_only(path)?;
    if !schema::registry_exists(&conn)? {
        return Err(format!("Not a sqlrepo database: {}", path.display()).into());
    }
    Ok(conn)
}
