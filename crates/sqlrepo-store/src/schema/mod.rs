//! Table layout and the entity registry
//!
//! Every table sqlrepo creates is recorded in `_sqlrepo_entities` together
//! with the descriptor it was created from and a SHA-256 checksum of its DDL.
//! Registering an entity whose DDL no longer matches the recorded checksum
//! fails instead of silently reading rows of another shape.

pub mod ddl;
pub mod registry;

pub use ddl::{create_table_sql, ddl_checksum};
pub use registry::{
    ensure_registry_table, list_entities, lookup_entity, register_entity, registry_exists,
    RegisteredEntity,
};
