use sha2::{Digest, Sha256};
use sqlrepo_core::compiler::quote_ident;
use sqlrepo_core::model::EntityDescriptor;

/// `CREATE TABLE IF NOT EXISTS` statement for an entity's persisted fields
pub fn create_table_sql(desc: &EntityDescriptor) -> String {
    let columns: Vec<String> = desc
        .persisted_fields()
        .map(|f| {
            let mut col = format!("{} {}", quote_ident(&f.name), f.kind.sql_type());
            if f.name == desc.identifier() {
                col.push_str(" NOT NULL PRIMARY KEY");
            }
            col
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(desc.table()),
        columns.join(", ")
    )
}

/// SHA-256 of the table's DDL, hex encoded
///
/// Covers column names, order and kinds; transient fields do not affect it.
pub fn ddl_checksum(desc: &EntityDescriptor) -> String {
    let mut hasher = Sha256::new();
    hasher.update(create_table_sql(desc).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlrepo_core::model::FieldKind;

    fn item() -> EntityDescriptor {
        EntityDescriptor::builder("item")
            .field("id", FieldKind::Integer)
            .field("price", FieldKind::Float)
            .field("label", FieldKind::Text)
            .field("active", FieldKind::Boolean)
            .transient("cache", FieldKind::Text)
            .identifier("id")
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            create_table_sql(&item()),
            "CREATE TABLE IF NOT EXISTS \"item\" (\"id\" INTEGER NOT NULL PRIMARY KEY, \
             \"price\" REAL, \"label\" TEXT, \"active\" INTEGER)"
        );
    }

    #[test]
    fn test_checksum_ignores_transient_fields() {
        let without = EntityDescriptor::builder("item")
            .field("id", FieldKind::Integer)
            .field("price", FieldKind::Float)
            .field("label", FieldKind::Text)
            .field("active", FieldKind::Boolean)
            .identifier("id")
            .build()
            .unwrap();
        assert_eq!(ddl_checksum(&item()), ddl_checksum(&without));
        assert_eq!(ddl_checksum(&item()).len(), 64);
    }

    #[test]
    fn test_checksum_tracks_kinds() {
        let changed = EntityDescriptor::builder("item")
            .field("id", FieldKind::Integer)
            .field("price", FieldKind::Integer)
            .field("label", FieldKind::Text)
            .field("active", FieldKind::Boolean)
            .identifier("id")
            .build()
            .unwrap();
        assert_ne!(ddl_checksum(&item()), ddl_checksum(&changed));
    }
}
