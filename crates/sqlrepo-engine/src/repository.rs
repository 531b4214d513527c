//! Repository facade with boundary logging.
//!
//! ## Logging Ownership
//!
//! The repository owns lifecycle logging for every public operation:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Each call gets a fresh `RequestId`, attached to the log events and to any
//! error it returns. Stores and the compiler only use `tracing::debug!()`.

use sqlrepo_core::compiler::{compile_filter, compile_join};
use sqlrepo_core::errors::{QueryError, RepoError, Result};
use sqlrepo_core::model::{Entity, EntityDescriptor, FieldKind, Literal, Record};
use sqlrepo_core::predicate::{eq, Predicate};
use sqlrepo_core::registry::DescriptorRegistry;
use sqlrepo_core::store::{MemoryStore, Store, UpsertOutcome};
use sqlrepo_core::{log_op_end, log_op_error, log_op_start};
use sqlrepo_core_types::RequestId;
use sqlrepo_store::{SqliteStore, StoreConfig};
use std::any::type_name;
use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;

/// Typed access to entity tables in a [`Store`]
///
/// Entity types must be registered with [`register_table`](Self::register_table)
/// before any other operation touches them.
#[derive(Debug)]
pub struct Repository<S: Store> {
    store: S,
    descriptors: DescriptorRegistry,
}

impl Repository<SqliteStore> {
    /// Open a SQLite database file with default settings
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// `Io` or `Persistence` when the database cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_config(&StoreConfig::new(path))
    }

    /// # Errors
    ///
    /// `Io` or `Persistence` when the database cannot be opened.
    pub fn open_with_config(config: &StoreConfig) -> Result<Self> {
        Ok(Self::with_store(SqliteStore::open(config)?))
    }
}

impl Repository<MemoryStore> {
    pub fn in_memory() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl<S: Store> Repository<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            descriptors: DescriptorRegistry::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create (if needed) the table for `T` and allow operations on it
    ///
    /// # Errors
    ///
    /// `MissingIdentifier` / `InvalidDescriptor` for a bad descriptor,
    /// `SchemaMismatch` when the table exists with another layout.
    pub async fn register_table<T: Entity>(&self) -> Result<()> {
        self.observe("register_table", self.label::<T>(), async {
            let desc = self.descriptors.resolve::<T>()?;
            self.store.ensure_table(&desc).await?;
            self.descriptors.mark_registered::<T>(desc)
        })
        .await
    }

    /// Insert or overwrite the row with `entity`'s identifier
    ///
    /// Transient fields are not written.
    ///
    /// # Errors
    ///
    /// `NotRegistered`, `Serialization` (e.g. a null identifier) or
    /// `Persistence`.
    pub async fn save<T: Entity>(&self, entity: &T) -> Result<UpsertOutcome> {
        self.observe("save", self.label::<T>(), async {
            let desc = self.descriptors.registered::<T>()?;
            let record = Record::from_entity(&desc, entity)?;
            self.store.upsert(&desc, &record).await
        })
        .await
    }

    /// # Errors
    ///
    /// `NotRegistered`, `TypeMismatch` when `id` does not fit the identifier
    /// kind, `Persistence` or `Serialization`.
    pub async fn find_by_id<T: Entity>(&self, id: impl Into<Literal>) -> Result<Option<T>> {
        let id = id.into();
        self.observe("find_by_id", self.label::<T>(), async {
            let desc = self.descriptors.registered::<T>()?;
            check_key(&desc, &id)?;
            self.store
                .get_by_key(&desc, &id)
                .await?
                .map(|r| r.into_entity(&desc))
                .transpose()
        })
        .await
    }

    /// Every row, ordered by identifier
    ///
    /// # Errors
    ///
    /// `NotRegistered`, `Persistence` or `Serialization`.
    pub async fn find_all<T: Entity>(&self) -> Result<Vec<T>> {
        self.observe("find_all", self.label::<T>(), async {
            let desc = self.descriptors.registered::<T>()?;
            let rows = self.store.scan(&desc, None).await?;
            decode_all(&desc, rows)
        })
        .await
    }

    /// Rows matching `predicate`, ordered by identifier
    ///
    /// The predicate is compiled before the store is touched.
    ///
    /// # Errors
    ///
    /// `UnknownField`, `TypeMismatch`, `UnsupportedOperator` or
    /// `EmptyPredicate` from compilation; `NotRegistered`; `Persistence`.
    pub async fn find_where<T: Entity>(&self, predicate: &Predicate) -> Result<Vec<T>> {
        self.observe("find_where", self.label::<T>(), async {
            let desc = self.descriptors.registered::<T>()?;
            let filter = compile_filter(predicate, &desc)?;
            tracing::debug!(entity = desc.table(), filter = %predicate, "compiled filter");
            let rows = self.store.scan(&desc, Some(&filter)).await?;
            decode_all(&desc, rows)
        })
        .await
    }

    /// Delete the row with `entity`'s identifier; `false` when there is none
    ///
    /// # Errors
    ///
    /// `NotRegistered`, `Serialization` or `Persistence`.
    pub async fn delete_by_instance<T: Entity>(&self, entity: &T) -> Result<bool> {
        self.observe("delete_by_instance", self.label::<T>(), async {
            let desc = self.descriptors.registered::<T>()?;
            let record = Record::from_entity(&desc, entity)?;
            match record.key(&desc) {
                Some(key) => self.store.delete(&desc, &key).await,
                None => Ok(false),
            }
        })
        .await
    }

    /// Delete by identifier; `false` when there is no such row
    ///
    /// # Errors
    ///
    /// `NotRegistered`, `TypeMismatch` or `Persistence`.
    pub async fn delete_by_id<T: Entity>(&self, id: impl Into<Literal>) -> Result<bool> {
        let id = id.into();
        self.observe("delete_by_id", self.label::<T>(), async {
            let desc = self.descriptors.registered::<T>()?;
            check_key(&desc, &id)?;
            self.store.delete(&desc, &id).await
        })
        .await
    }

    /// Children `C` whose parent `P` matches `predicate`
    ///
    /// Runs one SQL join on `P.identifier = C.foreign_key`, ordered by the
    /// child identifier. Only equality comparisons are supported.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperator`, `UnknownField`, `TypeMismatch` or
    /// `EmptyPredicate` from compilation; `NotRegistered`; `Persistence`.
    pub async fn join_flat<C: Entity, P: Entity>(
        &self,
        predicate: &Predicate,
        foreign_key: &str,
    ) -> Result<Vec<C>> {
        self.observe("join_flat", self.label::<C>(), async {
            let parent = self.descriptors.registered::<P>()?;
            let child = self.descriptors.registered::<C>()?;
            let clause = compile_join(predicate, &parent, &child, foreign_key)?;
            tracing::debug!(
                tables = ?clause.tables,
                where_sql = %clause.where_sql,
                "compiled join"
            );
            let rows = self.store.raw_scan(&clause).await?;
            decode_all(&child, rows)
        })
        .await
    }

    /// Parents `P` matching `predicate`, each with its children `C`
    ///
    /// Children are fetched per parent with a single-key scan on
    /// `foreign_key`. Parents without children are kept with an empty list.
    ///
    /// # Errors
    ///
    /// As [`join_flat`](Self::join_flat).
    pub async fn join_grouped<C: Entity, P: Entity>(
        &self,
        predicate: &Predicate,
        foreign_key: &str,
    ) -> Result<Vec<(P, Vec<C>)>> {
        self.observe("join_grouped", self.label::<P>(), async {
            let parent = self.descriptors.registered::<P>()?;
            let child = self.descriptors.registered::<C>()?;
            let clause = compile_join(predicate, &parent, &child, foreign_key)?;

            let parents = self
                .store
                .scan(&parent, Some(&clause.parent_filter))
                .await?;
            let mut groups = Vec::with_capacity(parents.len());
            for row in parents {
                let Some(key) = row.key(&parent) else {
                    continue;
                };
                let by_parent = compile_filter(&eq(foreign_key, key), &child)?;
                let children = self.store.scan(&child, Some(&by_parent)).await?;
                groups.push((row.into_entity::<P>(&parent)?, decode_all::<C>(&child, children)?));
            }
            Ok(groups)
        })
        .await
    }

    /// Name of `T`'s identifier field
    ///
    /// # Errors
    ///
    /// `MissingIdentifier` when `T` declares none.
    pub fn identifier_field<T: Entity>(&self) -> Result<String> {
        self.descriptors.identifier_field::<T>()
    }

    /// # Errors
    ///
    /// `UnknownField` when `T` declares no such field.
    pub fn is_transient<T: Entity>(&self, field: &str) -> Result<bool> {
        self.descriptors.is_transient::<T>(field)
    }

    /// Close the underlying store; later operations fail with `StoreClosed`
    ///
    /// # Errors
    ///
    /// `Persistence` when the store fails to release its resources.
    pub async fn close(&self) -> Result<()> {
        self.observe("close", "-".to_string(), self.store.close()).await
    }

    /// Table name of `T`, or its Rust type name when it has no valid descriptor
    fn label<T: Entity>(&self) -> String {
        self.descriptors
            .resolve::<T>()
            .map(|d| d.table().to_string())
            .unwrap_or_else(|_| type_name::<T>().to_string())
    }

    async fn observe<T, F>(&self, op: &'static str, entity: String, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let request_id = RequestId::new();
        log_op_start!(op, request_id = request_id.as_str(), entity = entity.as_str());
        let start = Instant::now();

        match work.await {
            Ok(value) => {
                log_op_end!(
                    op,
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = request_id.as_str(),
                    entity = entity.as_str()
                );
                Ok(value)
            }
            Err(err) => {
                let err = err.within(op).with_request_id(request_id.clone());
                log_op_error!(
                    op,
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = request_id.as_str(),
                    entity = entity.as_str()
                );
                Err(err)
            }
        }
    }
}

fn decode_all<T: Entity>(desc: &EntityDescriptor, rows: Vec<Record>) -> Result<Vec<T>> {
    rows.into_iter().map(|r| r.into_entity(desc)).collect()
}

/// An identifier literal must have exactly the identifier's kind
fn check_key(desc: &EntityDescriptor, key: &Literal) -> Result<()> {
    let expected = desc.identifier_def().map(|f| f.kind);
    let fits = matches!(
        (expected, key),
        (Some(FieldKind::Integer), Literal::Integer(_)) | (Some(FieldKind::Text), Literal::Text(_))
    );
    if fits {
        return Ok(());
    }
    Err(RepoError::from(QueryError::TypeMismatch {
        entity: desc.table().to_string(),
        field: desc.identifier().to_string(),
        expected: expected.map(|k| k.name()).unwrap_or("unknown").to_string(),
        found: key.type_name().to_string(),
    }))
}
