use super::{Store, UpsertOutcome};
use crate::compiler::{CompiledFilter, JoinClause};
use crate::errors::{RepoError, RepoErrorKind, Result};
use crate::model::{EntityDescriptor, Literal, Record, Value};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Row key, ordered like SQLite orders mixed keys: integers before text
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Key {
    Integer(i64),
    Text(String),
}

impl Key {
    fn from_literal(literal: &Literal) -> Option<Self> {
        match literal {
            Literal::Integer(v) => Some(Key::Integer(*v)),
            Literal::Text(v) => Some(Key::Text(v.clone())),
            _ => None,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(v) => Some(Key::Integer(*v)),
            Value::Text(v) => Some(Key::Text(v.clone())),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Table {
    desc: EntityDescriptor,
    rows: BTreeMap<Key, Record>,
}

#[derive(Debug, Default)]
struct State {
    closed: bool,
    tables: HashMap<String, Table>,
}

impl State {
    fn table(&self, name: &str) -> Result<&Table> {
        self.tables.get(name).ok_or_else(|| no_such_table(name))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables.get_mut(name).ok_or_else(|| no_such_table(name))
    }
}

/// Tables held in process memory
///
/// Filtered scans read the whole table and post-filter with
/// [`CompiledFilter::matches`]; joins are evaluated structurally from the
/// clause's parent filter. One lock guards all tables, so each call is
/// atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        let guard = self.state.read().map_err(|_| poisoned())?;
        if guard.closed {
            return Err(closed());
        }
        Ok(guard)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        let guard = self.state.write().map_err(|_| poisoned())?;
        if guard.closed {
            return Err(closed());
        }
        Ok(guard)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ensure_table(&self, desc: &EntityDescriptor) -> Result<()> {
        let mut state = self.write()?;
        if let Some(existing) = state.tables.get(desc.table()) {
            if existing.desc != *desc {
                return Err(RepoError::new(RepoErrorKind::SchemaMismatch)
                    .with_entity(desc.table())
                    .with_message("table exists with a different layout"));
            }
            return Ok(());
        }
        state.tables.insert(
            desc.table().to_string(),
            Table {
                desc: desc.clone(),
                rows: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn get_by_key(&self, desc: &EntityDescriptor, key: &Literal) -> Result<Option<Record>> {
        let state = self.read()?;
        let table = state.table(desc.table())?;
        Ok(Key::from_literal(key).and_then(|k| table.rows.get(&k).cloned()))
    }

    async fn insert(&self, desc: &EntityDescriptor, record: &Record) -> Result<()> {
        let key = record_key(desc, record)?;
        let mut state = self.write()?;
        let table = state.table_mut(desc.table())?;
        if table.rows.contains_key(&key) {
            return Err(RepoError::new(RepoErrorKind::Persistence)
                .with_entity(desc.table())
                .with_message(format!("duplicate key {:?}", key)));
        }
        table.rows.insert(key, record.clone());
        Ok(())
    }

    async fn update(&self, desc: &EntityDescriptor, record: &Record) -> Result<bool> {
        let key = record_key(desc, record)?;
        let mut state = self.write()?;
        let table = state.table_mut(desc.table())?;
        match table.rows.get_mut(&key) {
            Some(row) => {
                *row = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert(&self, desc: &EntityDescriptor, record: &Record) -> Result<UpsertOutcome> {
        let key = record_key(desc, record)?;
        let mut state = self.write()?;
        let table = state.table_mut(desc.table())?;
        match table.rows.insert(key, record.clone()) {
            Some(_) => Ok(UpsertOutcome::Updated),
            None => Ok(UpsertOutcome::Inserted),
        }
    }

    async fn delete(&self, desc: &EntityDescriptor, key: &Literal) -> Result<bool> {
        let mut state = self.write()?;
        let table = state.table_mut(desc.table())?;
        Ok(Key::from_literal(key)
            .map(|k| table.rows.remove(&k).is_some())
            .unwrap_or(false))
    }

    async fn scan(
        &self,
        desc: &EntityDescriptor,
        filter: Option<&CompiledFilter>,
    ) -> Result<Vec<Record>> {
        let state = self.read()?;
        let table = state.table(desc.table())?;
        Ok(table
            .rows
            .values()
            .filter(|r| filter.map(|f| f.matches(r)).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn raw_scan(&self, join: &JoinClause) -> Result<Vec<Record>> {
        let state = self.read()?;
        let parents = state.table(join.parent.table())?;
        let children = state.table(join.child.table())?;

        let parent_id = join.parent.identifier();
        let matched: BTreeSet<Key> = parents
            .rows
            .values()
            .filter(|r| join.parent_filter.matches(r))
            .filter_map(|r| Key::from_value(r.get(parent_id)))
            .collect();

        Ok(children
            .rows
            .values()
            .filter(|r| {
                Key::from_value(r.get(&join.foreign_key))
                    .map(|k| matched.contains(&k))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.closed = true;
        state.tables.clear();
        Ok(())
    }
}

fn record_key(desc: &EntityDescriptor, record: &Record) -> Result<Key> {
    Key::from_value(record.get(desc.identifier())).ok_or_else(|| {
        RepoError::new(RepoErrorKind::InvalidInput)
            .with_entity(desc.table())
            .with_field(desc.identifier())
            .with_message("record has no usable identifier")
    })
}

fn no_such_table(name: &str) -> RepoError {
    RepoError::new(RepoErrorKind::Persistence)
        .with_entity(name)
        .with_message(format!("no such table: {}", name))
}

fn closed() -> RepoError {
    RepoError::new(RepoErrorKind::StoreClosed).with_message("store is closed")
}

fn poisoned() -> RepoError {
    RepoError::new(RepoErrorKind::Concurrency).with_message("memory store lock poisoned")
}
