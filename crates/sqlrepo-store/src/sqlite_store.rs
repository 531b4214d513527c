//! Async `Store` over a single SQLite connection
//!
//! The connection lives behind a mutex and every call runs on tokio's
//! blocking pool, so async callers never block a runtime worker on disk I/O.
//! Holding the lock for the whole call makes each store operation atomic
//! with respect to the others.

use crate::config::StoreConfig;
use crate::db;
use crate::errors::{from_rusqlite, lock_poisoned, store_closed, task_error, Result};
use crate::schema::{self, RegisteredEntity};
use crate::tables::SqliteTables;
use async_trait::async_trait;
use rusqlite::Connection;
use sqlrepo_core::compiler::{CompiledFilter, JoinClause};
use sqlrepo_core::model::{EntityDescriptor, Literal, Record};
use sqlrepo_core::store::{Store, UpsertOutcome};
use std::sync::{Arc, Mutex};
use tokio::task;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStore {
    /// Open (creating when needed) the database a config points at
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let conn = db::open(config)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Wrap an already configured connection
    pub fn from_connection(conn: Connection) -> Result<Self> {
        schema::ensure_registry_table(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Entities recorded in the registry table, ordered by table name
    pub async fn registered_entities(&self) -> Result<Vec<RegisteredEntity>> {
        self.with_conn("registered_entities", |conn| schema::list_entities(conn))
            .await
    }

    async fn with_conn<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| lock_poisoned(op))?;
            let conn = guard.as_mut().ok_or_else(|| store_closed(op))?;
            f(conn).map_err(|e| e.within(op))
        })
        .await
        .map_err(|e| task_error(op, e))?
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn ensure_table(&self, desc: &EntityDescriptor) -> Result<()> {
        let desc = desc.clone();
        self.with_conn("ensure_table", move |conn| {
            let created = schema::register_entity(conn, &desc)?;
            if created {
                tracing::debug!(entity = desc.table(), "table created");
            }
            Ok(())
        })
        .await
    }

    async fn get_by_key(&self, desc: &EntityDescriptor, key: &Literal) -> Result<Option<Record>> {
        let (desc, key) = (desc.clone(), key.clone());
        self.with_conn("get_by_key", move |conn| {
            SqliteTables::get_by_key(conn, &desc, &key)
        })
        .await
    }

    async fn insert(&self, desc: &EntityDescriptor, record: &Record) -> Result<()> {
        let (desc, record) = (desc.clone(), record.clone());
        self.with_conn("insert", move |conn| {
            SqliteTables::insert(conn, &desc, &record)
        })
        .await
    }

    async fn update(&self, desc: &EntityDescriptor, record: &Record) -> Result<bool> {
        let (desc, record) = (desc.clone(), record.clone());
        self.with_conn("update", move |conn| {
            SqliteTables::update(conn, &desc, &record)
        })
        .await
    }

    async fn upsert(&self, desc: &EntityDescriptor, record: &Record) -> Result<UpsertOutcome> {
        let (desc, record) = (desc.clone(), record.clone());
        self.with_conn("upsert", move |conn| {
            SqliteTables::upsert(conn, &desc, &record)
        })
        .await
    }

    async fn delete(&self, desc: &EntityDescriptor, key: &Literal) -> Result<bool> {
        let (desc, key) = (desc.clone(), key.clone());
        self.with_conn("delete", move |conn| SqliteTables::delete(conn, &desc, &key))
            .await
    }

    async fn scan(
        &self,
        desc: &EntityDescriptor,
        filter: Option<&CompiledFilter>,
    ) -> Result<Vec<Record>> {
        let (desc, filter) = (desc.clone(), filter.cloned());
        self.with_conn("scan", move |conn| {
            SqliteTables::scan(conn, &desc, filter.as_ref())
        })
        .await
    }

    async fn raw_scan(&self, join: &JoinClause) -> Result<Vec<Record>> {
        let join = join.clone();
        self.with_conn("raw_scan", move |conn| SqliteTables::join_scan(conn, &join))
            .await
    }

    async fn close(&self) -> Result<()> {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| lock_poisoned("close"))?;
            match guard.take() {
                Some(conn) => conn
                    .close()
                    .map_err(|(_, e)| from_rusqlite(e).within("close")),
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| task_error("close", e))?
    }
}
