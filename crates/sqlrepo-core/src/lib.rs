//! sqlrepo core
//!
//! The storage-independent half of sqlrepo:
//! - entity descriptors, values and records
//! - the Predicate AST and its compiler (single-entity filters and
//!   two-entity joins)
//! - the `Store` contract and an in-memory implementation
//! - the error and logging facilities shared by every crate

pub mod compiler;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod predicate;
pub mod registry;
pub mod store;

pub use compiler::{compile_filter, compile_join, CompiledFilter, JoinClause};
pub use errors::{QueryError, RepoError, RepoErrorKind, Result};
pub use model::{Entity, EntityDescriptor, FieldKind, Literal, Record, Value};
pub use predicate::{CompareOp, Connective, Predicate};
pub use registry::DescriptorRegistry;
pub use store::{MemoryStore, Store, UpsertOutcome};
