use crate::errors::{from_rusqlite, schema_mismatch, Result};
use crate::schema::ddl::{create_table_sql, ddl_checksum};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension};
use sqlrepo_core::errors::serialization_error;
use sqlrepo_core::model::EntityDescriptor;

/// Row of `_sqlrepo_entities`
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredEntity {
    pub descriptor: EntityDescriptor,
    pub checksum: String,
    pub registered_at: DateTime<Utc>,
}

/// Create the registry table if it doesn't exist
pub fn ensure_registry_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _sqlrepo_entities (
            table_name TEXT PRIMARY KEY,
            descriptor TEXT NOT NULL,
            checksum TEXT NOT NULL,
            registered_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Whether the database carries an entity registry
pub fn registry_exists(conn: &Connection) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlrepo_entities'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;
    Ok(found.is_some())
}

/// Create an entity's table and record it, or confirm an existing record
///
/// Returns `true` when the table was registered by this call.
///
/// # Errors
///
/// `SchemaMismatch` when the table is registered with a different layout.
pub fn register_entity(conn: &mut Connection, desc: &EntityDescriptor) -> Result<bool> {
    let checksum = ddl_checksum(desc);
    let tx = conn.transaction().map_err(from_rusqlite)?;

    let existing: Option<String> = tx
        .query_row(
            "SELECT checksum FROM _sqlrepo_entities WHERE table_name = ?1",
            [desc.table()],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;

    if let Some(recorded) = existing {
        if recorded != checksum {
            return Err(schema_mismatch(desc.table(), &recorded, &checksum));
        }
        return Ok(false);
    }

    tx.execute(&create_table_sql(desc), [])
        .map_err(from_rusqlite)?;
    let descriptor_json = serde_json::to_string(desc)
        .map_err(|e| serialization_error(desc.table(), e.to_string()))?;
    tx.execute(
        "INSERT INTO _sqlrepo_entities (table_name, descriptor, checksum, registered_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![desc.table(), descriptor_json, checksum, Utc::now().timestamp()],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;
    Ok(true)
}

/// Registered entity by table name
pub fn lookup_entity(conn: &Connection, table: &str) -> Result<Option<RegisteredEntity>> {
    let row: Option<(String, String, i64)> = conn
        .query_row(
            "SELECT descriptor, checksum, registered_at FROM _sqlrepo_entities
             WHERE table_name = ?1",
            [table],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()
        .map_err(from_rusqlite)?;

    row.map(|(json, checksum, at)| decode(table, &json, checksum, at))
        .transpose()
}

/// All registered entities ordered by table name
pub fn list_entities(conn: &Connection) -> Result<Vec<RegisteredEntity>> {
    let mut stmt = conn
        .prepare(
            "SELECT table_name, descriptor, checksum, registered_at FROM _sqlrepo_entities
             ORDER BY table_name",
        )
        .map_err(from_rusqlite)?;
    let rows: Vec<(String, String, String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    rows.into_iter()
        .map(|(table, json, checksum, at)| decode(&table, &json, checksum, at))
        .collect()
}

fn decode(table: &str, json: &str, checksum: String, at: i64) -> Result<RegisteredEntity> {
    let descriptor: EntityDescriptor =
        serde_json::from_str(json).map_err(|e| serialization_error(table, e.to_string()))?;
    descriptor.validate()?;
    let registered_at = Utc
        .timestamp_opt(at, 0)
        .single()
        .ok_or_else(|| serialization_error(table, format!("bad registration time {}", at)))?;
    Ok(RegisteredEntity {
        descriptor,
        checksum,
        registered_at,
    })
}
