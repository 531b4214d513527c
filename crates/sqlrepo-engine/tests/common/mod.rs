#![allow(dead_code)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlrepo_core::compiler::{CompiledFilter, JoinClause};
use sqlrepo_core::errors::{QueryError, Result};
use sqlrepo_core::model::{Entity, EntityDescriptor, FieldKind, Literal, Record};
use sqlrepo_core::store::{MemoryStore, Store, UpsertOutcome};
use sqlrepo_engine::{Repository, SqliteStore};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub amount: i64,
    pub label: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl Item {
    pub fn new(id: i64, amount: i64, label: &str) -> Self {
        Self {
            id,
            amount,
            label: label.to_string(),
            note: None,
        }
    }
}

impl Entity for Item {
    fn descriptor() -> std::result::Result<EntityDescriptor, QueryError> {
        EntityDescriptor::builder("item")
            .field("id", FieldKind::Integer)
            .field("amount", FieldKind::Integer)
            .field("label", FieldKind::Text)
            .transient("note", FieldKind::Text)
            .identifier("id")
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lottery {
    pub id: i64,
    pub status: i64,
    pub name: String,
}

impl Lottery {
    pub fn new(id: i64, status: i64, name: &str) -> Self {
        Self {
            id,
            status,
            name: name.to_string(),
        }
    }
}

impl Entity for Lottery {
    fn descriptor() -> std::result::Result<EntityDescriptor, QueryError> {
        EntityDescriptor::builder("lottery")
            .field("id", FieldKind::Integer)
            .field("status", FieldKind::Integer)
            .field("name", FieldKind::Text)
            .identifier("id")
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub lottery_id: i64,
    pub number: i64,
}

impl Ticket {
    pub fn new(id: i64, lottery_id: i64, number: i64) -> Self {
        Self {
            id,
            lottery_id,
            number,
        }
    }
}

impl Entity for Ticket {
    fn descriptor() -> std::result::Result<EntityDescriptor, QueryError> {
        EntityDescriptor::builder("ticket")
            .field("id", FieldKind::Integer)
            .field("lottery_id", FieldKind::Integer)
            .field("number", FieldKind::Integer)
            .identifier("id")
            .build()
    }
}

/// Text-keyed entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub slug: String,
    pub weight: f64,
    pub pinned: bool,
}

impl Entity for Tag {
    fn descriptor() -> std::result::Result<EntityDescriptor, QueryError> {
        EntityDescriptor::builder("tag")
            .field("slug", FieldKind::Text)
            .field("weight", FieldKind::Float)
            .field("pinned", FieldKind::Boolean)
            .identifier("slug")
            .build()
    }
}

/// Entity without an identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyless {
    pub name: String,
}

impl Entity for Keyless {
    fn descriptor() -> std::result::Result<EntityDescriptor, QueryError> {
        EntityDescriptor::builder("keyless")
            .field("name", FieldKind::Text)
            .build()
    }
}

pub fn sqlite_repo() -> Repository<SqliteStore> {
    Repository::with_store(SqliteStore::open_in_memory().unwrap())
}

pub fn memory_repo() -> Repository<MemoryStore> {
    Repository::in_memory()
}

/// Memory store that counts every call reaching it
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn ensure_table(&self, desc: &EntityDescriptor) -> Result<()> {
        self.hit();
        self.inner.ensure_table(desc).await
    }

    async fn get_by_key(&self, desc: &EntityDescriptor, key: &Literal) -> Result<Option<Record>> {
        self.hit();
        self.inner.get_by_key(desc, key).await
    }

    async fn insert(&self, desc: &EntityDescriptor, record: &Record) -> Result<()> {
        self.hit();
        self.inner.insert(desc, record).await
    }

    async fn update(&self, desc: &EntityDescriptor, record: &Record) -> Result<bool> {
        self.hit();
        self.inner.update(desc, record).await
    }

    async fn upsert(&self, desc: &EntityDescriptor, record: &Record) -> Result<UpsertOutcome> {
        self.hit();
        self.inner.upsert(desc, record).await
    }

    async fn delete(&self, desc: &EntityDescriptor, key: &Literal) -> Result<bool> {
        self.hit();
        self.inner.delete(desc, key).await
    }

    async fn scan(
        &self,
        desc: &EntityDescriptor,
        filter: Option<&CompiledFilter>,
    ) -> Result<Vec<Record>> {
        self.hit();
        self.inner.scan(desc, filter).await
    }

    async fn raw_scan(&self, join: &JoinClause) -> Result<Vec<Record>> {
        self.hit();
        self.inner.raw_scan(join).await
    }

    async fn close(&self) -> Result<()> {
        self.hit();
        self.inner.close().await
    }
}
