//! Row operations on entity tables
//!
//! Static functions over a borrowed connection. Statements are built from
//! descriptor names (validated plain identifiers, quoted) and every value is
//! bound as a parameter.

use crate::errors::{decode_error, from_rusqlite, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use sqlrepo_core::compiler::{quote_ident, CompiledFilter, JoinClause};
use sqlrepo_core::errors::{RepoError, RepoErrorKind};
use sqlrepo_core::model::{EntityDescriptor, FieldDef, FieldKind, Literal, Record, Value};
use sqlrepo_core::store::UpsertOutcome;

/// SQLite operations for registered entity tables
pub struct SqliteTables;

impl SqliteTables {
    /// Fetch one row by identifier
    pub fn get_by_key(
        conn: &Connection,
        desc: &EntityDescriptor,
        key: &Literal,
    ) -> Result<Option<Record>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            column_list(desc),
            quote_ident(desc.table()),
            quote_ident(desc.identifier())
        );
        let fields = persisted(desc);
        conn.query_row(&sql, [literal_to_sql(key)], |row| read_row(row, &fields))
            .optional()
            .map_err(from_rusqlite)?
            .map(|cells| decode_record(desc, &fields, cells))
            .transpose()
    }

    /// Insert a row; fails with `Persistence` when the key exists
    pub fn insert(conn: &Connection, desc: &EntityDescriptor, record: &Record) -> Result<()> {
        require_key(desc, record)?;
        let fields = persisted(desc);
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(desc.table()),
            column_list(desc),
            placeholders(fields.len())
        );
        conn.execute(&sql, params_from_iter(record_params(&fields, record)))
            .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Overwrite the row with the record's key; `false` when there is none
    pub fn update(conn: &Connection, desc: &EntityDescriptor, record: &Record) -> Result<bool> {
        require_key(desc, record)?;
        let fields = persisted(desc);
        let assignments: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{} = ?{}", quote_ident(&f.name), i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(desc.table()),
            assignments.join(", "),
            quote_ident(desc.identifier()),
            fields.len() + 1
        );
        let mut params = record_params(&fields, record);
        params.push(value_to_sql(record.get(desc.identifier())));
        let changed = conn
            .execute(&sql, params_from_iter(params))
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    /// Insert or overwrite inside one transaction
    pub fn upsert(
        conn: &mut Connection,
        desc: &EntityDescriptor,
        record: &Record,
    ) -> Result<UpsertOutcome> {
        let key = require_key(desc, record)?;
        let fields = persisted(desc);
        let tx = conn.transaction().map_err(from_rusqlite)?;

        let exists: bool = tx
            .query_row(
                &format!(
                    "SELECT 1 FROM {} WHERE {} = ?1",
                    quote_ident(desc.table()),
                    quote_ident(desc.identifier())
                ),
                [literal_to_sql(&key)],
                |_| Ok(true),
            )
            .optional()
            .map_err(from_rusqlite)?
            .unwrap_or(false);

        let updates: Vec<String> = fields
            .iter()
            .filter(|f| f.name != desc.identifier())
            .map(|f| format!("{0} = excluded.{0}", quote_ident(&f.name)))
            .collect();
        let conflict = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) {}",
            quote_ident(desc.table()),
            column_list(desc),
            placeholders(fields.len()),
            quote_ident(desc.identifier()),
            conflict
        );
        tx.execute(&sql, params_from_iter(record_params(&fields, record)))
            .map_err(from_rusqlite)?;
        tx.commit().map_err(from_rusqlite)?;

        Ok(if exists {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    /// Delete by identifier; `false` when no row matched
    pub fn delete(conn: &Connection, desc: &EntityDescriptor, key: &Literal) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(desc.table()),
            quote_ident(desc.identifier())
        );
        let changed = conn
            .execute(&sql, [literal_to_sql(key)])
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    /// Rows matching `filter` (all rows when `None`), ordered by identifier
    pub fn scan(
        conn: &Connection,
        desc: &EntityDescriptor,
        filter: Option<&CompiledFilter>,
    ) -> Result<Vec<Record>> {
        let mut sql = format!(
            "SELECT {} FROM {}",
            column_list(desc),
            quote_ident(desc.table())
        );
        let mut params = Vec::new();
        if let Some(filter) = filter {
            let fragment = filter.to_sql(None, 1);
            sql.push_str(" WHERE ");
            sql.push_str(&fragment.sql);
            params = fragment.params.iter().map(literal_to_sql).collect();
        }
        sql.push_str(&format!(" ORDER BY {}", quote_ident(desc.identifier())));
        query_records(conn, desc, &sql, params)
    }

    /// Child rows selected by a compiled join
    pub fn join_scan(conn: &Connection, join: &JoinClause) -> Result<Vec<Record>> {
        let params = join.params.iter().map(literal_to_sql).collect();
        query_records(conn, &join.child, &join.select_sql(), params)
    }
}

fn persisted(desc: &EntityDescriptor) -> Vec<FieldDef> {
    desc.persisted_fields().cloned().collect()
}

fn column_list(desc: &EntityDescriptor) -> String {
    desc.persisted_fields()
        .map(|f| quote_ident(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn require_key(desc: &EntityDescriptor, record: &Record) -> Result<Literal> {
    record.key(desc).ok_or_else(|| {
        RepoError::new(RepoErrorKind::InvalidInput)
            .with_entity(desc.table())
            .with_field(desc.identifier())
            .with_message("record has no usable identifier")
    })
}

fn record_params(fields: &[FieldDef], record: &Record) -> Vec<SqlValue> {
    fields
        .iter()
        .map(|f| value_to_sql(record.get(&f.name)))
        .collect()
}

fn query_records(
    conn: &Connection,
    desc: &EntityDescriptor,
    sql: &str,
    params: Vec<SqlValue>,
) -> Result<Vec<Record>> {
    let fields = persisted(desc);
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    let rows: Vec<Vec<SqlValue>> = stmt
        .query_map(params_from_iter(params), |row| read_row(row, &fields))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    rows.into_iter()
        .map(|cells| decode_record(desc, &fields, cells))
        .collect()
}

fn read_row(row: &Row<'_>, fields: &[FieldDef]) -> rusqlite::Result<Vec<SqlValue>> {
    (0..fields.len()).map(|i| row.get::<_, SqlValue>(i)).collect()
}

fn decode_record(
    desc: &EntityDescriptor,
    fields: &[FieldDef],
    cells: Vec<SqlValue>,
) -> Result<Record> {
    let mut record = Record::new();
    for (field, cell) in fields.iter().zip(cells) {
        let value = sql_to_value(field.kind, cell)
            .map_err(|reason| decode_error(desc.table(), &field.name, reason))?;
        record.set(field.name.clone(), value);
    }
    Ok(record)
}

/// Booleans are stored as 0/1
fn literal_to_sql(literal: &Literal) -> SqlValue {
    match literal {
        Literal::Integer(v) => SqlValue::Integer(*v),
        Literal::Float(v) => SqlValue::Real(*v),
        Literal::Text(v) => SqlValue::Text(v.clone()),
        Literal::Boolean(v) => SqlValue::Integer(i64::from(*v)),
    }
}

fn value_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Float(v) => SqlValue::Real(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Boolean(v) => SqlValue::Integer(i64::from(*v)),
        Value::Null => SqlValue::Null,
    }
}

fn sql_to_value(kind: FieldKind, cell: SqlValue) -> std::result::Result<Value, String> {
    match (kind, cell) {
        (_, SqlValue::Null) => Ok(Value::Null),
        (FieldKind::Integer, SqlValue::Integer(v)) => Ok(Value::Integer(v)),
        (FieldKind::Float, SqlValue::Real(v)) => Ok(Value::Float(v)),
        (FieldKind::Float, SqlValue::Integer(v)) => Ok(Value::Float(v as f64)),
        (FieldKind::Text, SqlValue::Text(v)) => Ok(Value::Text(v)),
        (FieldKind::Boolean, SqlValue::Integer(v)) => Ok(Value::Boolean(v != 0)),
        (kind, other) => Err(format!("expected {}, found {:?}", kind.name(), other)),
    }
}
