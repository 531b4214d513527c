//! Storage contract consumed by the repository
//!
//! A store keeps one table per registered entity and knows nothing about
//! entity types: it moves [`Record`]s keyed by the descriptor's identifier.
//! Every method is async; implementations backed by blocking I/O hand the
//! work to a blocking pool.

mod memory;

pub use memory::MemoryStore;

use crate::compiler::{CompiledFilter, JoinClause};
use crate::errors::Result;
use crate::model::{EntityDescriptor, Literal, Record};
use async_trait::async_trait;

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Create the entity's table if it does not exist
    ///
    /// # Errors
    ///
    /// `SchemaMismatch` when a table of that name exists with another layout.
    async fn ensure_table(&self, desc: &EntityDescriptor) -> Result<()>;

    async fn get_by_key(&self, desc: &EntityDescriptor, key: &Literal) -> Result<Option<Record>>;

    /// Insert a new row
    ///
    /// # Errors
    ///
    /// `Persistence` when a row with the same key exists.
    async fn insert(&self, desc: &EntityDescriptor, record: &Record) -> Result<()>;

    /// Replace an existing row; `false` when no row has the record's key
    async fn update(&self, desc: &EntityDescriptor, record: &Record) -> Result<bool>;

    /// Insert or replace in one atomic step
    async fn upsert(&self, desc: &EntityDescriptor, record: &Record) -> Result<UpsertOutcome>;

    /// Delete by key in one atomic step; `false` when nothing matched
    async fn delete(&self, desc: &EntityDescriptor, key: &Literal) -> Result<bool>;

    /// All rows, or those matching `filter`, ordered by identifier
    async fn scan(
        &self,
        desc: &EntityDescriptor,
        filter: Option<&CompiledFilter>,
    ) -> Result<Vec<Record>>;

    /// Child rows selected by a compiled join, ordered by child identifier
    async fn raw_scan(&self, join: &JoinClause) -> Result<Vec<Record>>;

    /// Release the store; later calls fail with `StoreClosed`
    ///
    /// Closing twice is not an error.
    async fn close(&self) -> Result<()>;
}
