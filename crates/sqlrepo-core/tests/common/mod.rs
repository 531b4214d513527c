#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use sqlrepo_core::errors::QueryError;
use sqlrepo_core::model::{Entity, EntityDescriptor, FieldKind, Record, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub amount: i64,
    pub label: String,
    #[serde(default)]
    pub scratch: Option<String>,
}

impl Item {
    pub fn new(id: i64, amount: i64, label: &str) -> Self {
        Self {
            id,
            amount,
            label: label.to_string(),
            scratch: None,
        }
    }
}

impl Entity for Item {
    fn descriptor() -> Result<EntityDescriptor, QueryError> {
        EntityDescriptor::builder("item")
            .field("id", FieldKind::Integer)
            .field("amount", FieldKind::Integer)
            .field("label", FieldKind::Text)
            .transient("scratch", FieldKind::Text)
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

impl Entity for Lottery {
    fn descriptor() -> Result<EntityDescriptor, QueryError> {
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

impl Entity for Ticket {
    fn descriptor() -> Result<EntityDescriptor, QueryError> {
        EntityDescriptor::builder("ticket")
            .field("id", FieldKind::Integer)
            .field("lottery_id", FieldKind::Integer)
            .field("number", FieldKind::Integer)
            .identifier("id")
            .build()
    }
}

pub fn item_record(id: i64, amount: i64, label: &str) -> Record {
    Record::new()
        .with("id", Value::Integer(id))
        .with("amount", Value::Integer(amount))
        .with("label", Value::Text(label.to_string()))
}
