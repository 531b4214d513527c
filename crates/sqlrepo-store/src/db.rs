//! Database connection management
//!
//! Opens SQLite connections from a `StoreConfig` and applies its pragmas

use crate::config::StoreConfig;
use crate::errors::{from_rusqlite, io_error, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

/// Open the database a config points at
///
/// Creates missing parent directories when `create_dirs` is set.
pub fn open(config: &StoreConfig) -> Result<Connection> {
    let conn = if config.is_in_memory() {
        Connection::open_in_memory().map_err(from_rusqlite)?
    } else {
        if config.create_dirs {
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| io_error("create_dirs", e))?;
                }
            }
        }
        Connection::open(&config.path).map_err(from_rusqlite)?
    };
    configure(&conn, config)?;
    Ok(conn)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    open(&StoreConfig::in_memory())
}

/// Open an existing database file without writing to it
///
/// Fails when the file is missing. No pragmas are applied.
pub fn open_read_only(path: &Path) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(path, flags).map_err(from_rusqlite)
}

/// Apply the config's pragmas to a connection
pub fn configure(conn: &Connection, config: &StoreConfig) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", config.foreign_keys)
        .map_err(from_rusqlite)?;
    conn.pragma_update(None, "journal_mode", config.journal_mode.pragma_value())
        .map_err(from_rusqlite)?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(from_rusqlite)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JournalMode;

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("store.db");
        let conn = open(&StoreConfig::new(&path)).unwrap();
        drop(conn);
        assert!(path.exists());
    }

    #[test]
    fn test_pragmas_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = StoreConfig::new(dir.path().join("p.db"));
        cfg.journal_mode = JournalMode::Delete;
        let conn = open(&cfg).unwrap();

        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |r| r.get(0))
            .unwrap();
        assert_eq!(fk, 1);
        assert_eq!(mode.to_lowercase(), "delete");
    }

    #[test]
    fn test_open_read_only_rejects_writes_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.db");
        assert!(open_read_only(&path).is_err());
        assert!(!path.exists());

        drop(open(&StoreConfig::new(&path)).unwrap());
        let conn = open_read_only(&path).unwrap();
        assert!(conn.execute("CREATE TABLE t (x INTEGER)", []).is_err());
    }

    #[test]
    fn test_missing_parent_without_create_dirs_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = StoreConfig::new(dir.path().join("absent").join("store.db"));
        cfg.create_dirs = false;
        assert!(open(&cfg).is_err());
    }
}
