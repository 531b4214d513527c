//! sqlrepo engine - the repository facade
//!
//! `Repository` ties entity descriptors, the predicate compiler and a
//! `Store` together behind typed save / find / delete / join operations.

pub mod repository;

pub use repository::Repository;
pub use sqlrepo_core::predicate;
pub use sqlrepo_core::store::{MemoryStore, Store, UpsertOutcome};
pub use sqlrepo_store::{SqliteStore, StoreConfig};
