//! Records: the persisted fields of one entity instance
//!
//! Entities move in and out of records through `serde_json`, typed by the
//! entity's descriptor. Transient fields are dropped on the way in and left
//! to `#[serde(default)]` on the way out.

use crate::errors::{serialization_error, RepoError, Result};
use crate::model::descriptor::{Entity, EntityDescriptor, FieldKind};
use crate::model::value::{Literal, Value};
use serde_json::{Map, Number};
use std::collections::BTreeMap;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    /// Missing fields read as `Null`
    pub fn get(&self, field: &str) -> &Value {
        self.values.get(field).unwrap_or(&NULL)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The identifier value as a literal, if set
    pub fn key(&self, desc: &EntityDescriptor) -> Option<Literal> {
        match self.get(desc.identifier()) {
            Value::Integer(v) => Some(Literal::Integer(*v)),
            Value::Text(v) => Some(Literal::Text(v.clone())),
            _ => None,
        }
    }

    /// Convert an entity to its persisted record
    ///
    /// # Errors
    ///
    /// `Serialization` when the entity does not serialize to an object, a
    /// field has a shape its descriptor kind does not allow, or the
    /// identifier is null.
    pub fn from_entity<T: Entity>(desc: &EntityDescriptor, entity: &T) -> Result<Self> {
        let json = serde_json::to_value(entity)
            .map_err(|e| serialization_error(desc.table(), e.to_string()))?;
        let serde_json::Value::Object(mut object) = json else {
            return Err(serialization_error(
                desc.table(),
                "entity must serialize to a JSON object",
            ));
        };

        let mut record = Record::new();
        for field in desc.persisted_fields() {
            let json = object.remove(&field.name).unwrap_or(serde_json::Value::Null);
            let value = json_to_value(field.kind, json).map_err(|reason| {
                serialization_error(desc.table(), reason).with_field(field.name.clone())
            })?;
            record.set(field.name.clone(), value);
        }

        if record.key(desc).is_none() {
            return Err(serialization_error(desc.table(), "identifier is null")
                .with_field(desc.identifier()));
        }
        record.check_reads_back::<T>(desc)?;
        Ok(record)
    }

    /// A record that cannot be decoded into `T` must never reach a store
    ///
    /// `serde_json` writes non-finite floats as `null`, which a plain `f64`
    /// field then refuses on read.
    fn check_reads_back<T: Entity>(&self, desc: &EntityDescriptor) -> Result<()> {
        let Err(err) = self.clone().into_entity::<T>(desc) else {
            return Ok(());
        };
        let nulled = desc
            .persisted_fields()
            .find(|f| f.kind == FieldKind::Float && self.get(&f.name).is_null());
        match nulled {
            Some(field) => Err(serialization_error(
                desc.table(),
                format!(
                    "field {} is not a finite float and cannot be stored: {}",
                    field.name,
                    err.message()
                ),
            )
            .with_field(field.name.clone())),
            None => Err(serialization_error(
                desc.table(),
                format!("record does not read back: {}", err.message()),
            )),
        }
    }

    /// Convert a stored record back into an entity
    ///
    /// # Errors
    ///
    /// `Serialization` when the entity type rejects the assembled object.
    pub fn into_entity<T: Entity>(self, desc: &EntityDescriptor) -> Result<T> {
        let mut object = Map::new();
        for (name, value) in self.values {
            if desc.is_transient(&name) {
                continue;
            }
            object.insert(name, value_to_json(value));
        }
        serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| serialization_error(desc.table(), e.to_string()))
    }

    /// Render as a JSON object (CLI output)
    pub fn to_json(&self) -> serde_json::Value {
        let object: Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), value_to_json(v.clone())))
            .collect();
        serde_json::Value::Object(object)
    }
}

fn json_to_value(kind: FieldKind, json: serde_json::Value) -> std::result::Result<Value, String> {
    use serde_json::Value as J;
    match (kind, json) {
        (_, J::Null) => Ok(Value::Null),
        (FieldKind::Integer, J::Number(n)) => n
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| format!("{} does not fit a 64-bit integer", n)),
        (FieldKind::Float, J::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| format!("{} is not a float", n)),
        (FieldKind::Text, J::String(s)) => Ok(Value::Text(s)),
        (FieldKind::Boolean, J::Bool(b)) => Ok(Value::Boolean(b)),
        (kind, other) => Err(format!("expected {}, found {}", kind.name(), other)),
    }
}

fn value_to_json(value: Value) -> serde_json::Value {
    use serde_json::Value as J;
    match value {
        Value::Integer(v) => J::Number(v.into()),
        Value::Float(v) => Number::from_f64(v).map(J::Number).unwrap_or(J::Null),
        Value::Text(v) => J::String(v),
        Value::Boolean(v) => J::Bool(v),
        Value::Null => J::Null,
    }
}

impl TryFrom<(&EntityDescriptor, serde_json::Value)> for Record {
    type Error = RepoError;

    /// Build a record from loose JSON (fixtures, CLI input), typed by `desc`
    fn try_from((desc, json): (&EntityDescriptor, serde_json::Value)) -> Result<Self> {
        let serde_json::Value::Object(mut object) = json else {
            return Err(serialization_error(desc.table(), "expected a JSON object"));
        };
        let mut record = Record::new();
        for field in desc.persisted_fields() {
            let json = object.remove(&field.name).unwrap_or(serde_json::Value::Null);
            let value = json_to_value(field.kind, json)
                .map_err(|reason| serialization_error(desc.table(), reason))?;
            record.set(field.name.clone(), value);
        }
        Ok(record)
    }
}
