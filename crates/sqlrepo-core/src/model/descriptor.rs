//! Entity descriptors
//!
//! A descriptor is the static schema of one entity type: its table, its
//! persisted and transient fields, and which field is the identifier. It is
//! declared explicitly by the type (see [`Entity`]) instead of being
//! discovered at runtime.

use crate::errors::QueryError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Storage kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Float,
    Text,
    Boolean,
}

impl FieldKind {
    /// SQLite column type
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldKind::Integer | FieldKind::Boolean => "INTEGER",
            FieldKind::Float => "REAL",
            FieldKind::Text => "TEXT",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Float)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Text => "text",
            FieldKind::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Excluded from persistence
    #[serde(default)]
    pub transient: bool,
}

/// Static schema of an entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    table: String,
    identifier: String,
    fields: Vec<FieldDef>,
}

impl EntityDescriptor {
    pub fn builder(table: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            table: table.into(),
            identifier: None,
            fields: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Name of the identifier (primary key) field
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Definition of the identifier field
    ///
    /// Always `Some` for descriptors produced by `build()` or accepted by
    /// `validate()`.
    pub fn identifier_def(&self) -> Option<&FieldDef> {
        self.field(&self.identifier)
    }

    /// All declared fields, transient ones included, in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Fields written to the store, in declaration order
    pub fn persisted_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.transient)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field that is persisted, failing with `UnknownField` otherwise
    pub fn persisted_field(&self, name: &str) -> Result<&FieldDef, QueryError> {
        self.field(name)
            .filter(|f| !f.transient)
            .ok_or_else(|| QueryError::UnknownField {
                entity: self.table.clone(),
                field: name.to_string(),
            })
    }

    /// Whether `name` is declared transient; `false` for undeclared names
    pub fn is_transient(&self, name: &str) -> bool {
        self.field(name).map(|f| f.transient).unwrap_or(false)
    }

    /// Re-run the structural checks, for descriptors that were deserialized
    pub fn validate(&self) -> Result<(), QueryError> {
        let builder = DescriptorBuilder {
            table: self.table.clone(),
            identifier: Some(self.identifier.clone()),
            fields: self.fields.clone(),
        };
        builder.build().map(|_| ())
    }
}

/// Builder for [`EntityDescriptor`]
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    table: String,
    identifier: Option<String>,
    fields: Vec<FieldDef>,
}

impl DescriptorBuilder {
    /// Declare a persisted field
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind,
            transient: false,
        });
        self
    }

    /// Declare a field that is never persisted
    pub fn transient(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind,
            transient: true,
        });
        self
    }

    /// Designate the identifier field; it must also be declared with `field`
    pub fn identifier(mut self, name: impl Into<String>) -> Self {
        self.identifier = Some(name.into());
        self
    }

    /// Validate and produce the descriptor
    ///
    /// # Errors
    ///
    /// - `MissingIdentifier` when no identifier was designated
    /// - `UnknownField` when the identifier names an undeclared field
    /// - `InvalidDescriptor` for bad names, duplicates, or an identifier that
    ///   is transient or not integer/text
    pub fn build(self) -> Result<EntityDescriptor, QueryError> {
        let invalid = |reason: String| QueryError::InvalidDescriptor {
            entity: self.table.clone(),
            reason,
        };

        if !is_sql_identifier(&self.table) {
            return Err(invalid(format!("table name {:?} is not a plain identifier", self.table)));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !is_sql_identifier(&field.name) {
                return Err(invalid(format!(
                    "field name {:?} is not a plain identifier",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!("field {} declared twice", field.name)));
            }
        }

        let identifier = self
            .identifier
            .clone()
            .ok_or_else(|| QueryError::MissingIdentifier {
                entity: self.table.clone(),
            })?;

        let id_field = self
            .fields
            .iter()
            .find(|f| f.name == identifier)
            .ok_or_else(|| QueryError::UnknownField {
                entity: self.table.clone(),
                field: identifier.clone(),
            })?;

        if id_field.transient {
            return Err(invalid(format!("identifier {} cannot be transient", identifier)));
        }
        if !matches!(id_field.kind, FieldKind::Integer | FieldKind::Text) {
            return Err(invalid(format!(
                "identifier {} must be integer or text, not {}",
                identifier,
                id_field.kind.name()
            )));
        }

        Ok(EntityDescriptor {
            table: self.table,
            identifier,
            fields: self.fields,
        })
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A type persisted as one table
///
/// Transient fields must carry `#[serde(default)]`: they are not stored,
/// so they are absent when a record is turned back into the type.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use sqlrepo_core::errors::QueryError;
/// use sqlrepo_core::model::{Entity, EntityDescriptor, FieldKind};
///
/// #[derive(Serialize, Deserialize)]
/// struct Item {
///     id: i64,
///     label: String,
/// }
///
/// impl Entity for Item {
///     fn descriptor() -> Result<EntityDescriptor, QueryError> {
///         EntityDescriptor::builder("item")
///             .field("id", FieldKind::Integer)
///             .field("label", FieldKind::Text)
///             .identifier("id")
///             .build()
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn descriptor() -> Result<EntityDescriptor, QueryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> DescriptorBuilder {
        EntityDescriptor::builder("item")
            .field("id", FieldKind::Integer)
            .field("amount", FieldKind::Integer)
            .transient("cached_total", FieldKind::Float)
    }

    #[test]
    fn test_build_valid_descriptor() {
        let desc = item().identifier("id").build().unwrap();
        assert_eq!(desc.identifier(), "id");
        assert_eq!(desc.identifier_def().map(|f| f.kind), Some(FieldKind::Integer));
        assert_eq!(desc.persisted_fields().count(), 2);
        assert!(desc.is_transient("cached_total"));
        assert!(!desc.is_transient("amount"));
        assert!(!desc.is_transient("nope"));
    }

    #[test]
    fn test_missing_identifier_is_rejected() {
        let err = item().build().unwrap_err();
        assert_eq!(
            err,
            QueryError::MissingIdentifier {
                entity: "item".to_string()
            }
        );
    }

    #[test]
    fn test_identifier_must_be_declared() {
        let err = item().identifier("uuid").build().unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { field, .. } if field == "uuid"));
    }

    #[test]
    fn test_transient_identifier_is_rejected() {
        let err = item().identifier("cached_total").build().unwrap_err();
        assert!(matches!(err, QueryError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_float_identifier_is_rejected() {
        let err = EntityDescriptor::builder("reading")
            .field("value", FieldKind::Float)
            .identifier("value")
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_injection_shaped_names_are_rejected() {
        let err = EntityDescriptor::builder("item; DROP TABLE x")
            .field("id", FieldKind::Integer)
            .identifier("id")
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidDescriptor { .. }));

        let err = EntityDescriptor::builder("item")
            .field("id", FieldKind::Integer)
            .field("a\"b", FieldKind::Text)
            .identifier("id")
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let err = item()
            .field("amount", FieldKind::Text)
            .identifier("id")
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidDescriptor { reason, .. } if reason.contains("twice")));
    }

    #[test]
    fn test_persisted_field_hides_transient() {
        let desc = item().identifier("id").build().unwrap();
        assert!(desc.persisted_field("amount").is_ok());
        assert!(matches!(
            desc.persisted_field("cached_total"),
            Err(QueryError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_descriptor_json_round_trip_validates() {
        let desc = item().identifier("id").build().unwrap();
        let json = serde_json::to_string(&desc).unwrap();
        let back: EntityDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
        assert!(back.validate().is_ok());
    }
}
