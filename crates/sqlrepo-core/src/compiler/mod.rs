//! Predicate compiler
//!
//! Two lowerings of the same [`Predicate`](crate::predicate::Predicate):
//!
//! - [`compile_filter`]: a single-entity filter. It evaluates in memory
//!   against a [`Record`](crate::model::Record) and renders as a
//!   parameterised `WHERE` fragment for stores that can push it down.
//!   Supports every [`CompareOp`](crate::predicate::CompareOp).
//! - [`compile_join`]: a two-entity join. Renders the predicate over the
//!   parent entity as `WHERE` text joined on
//!   `parent.identifier = child.foreign_key`. Equality only.
//!
//! Both are pure functions of their inputs. Neither interpolates values:
//! every literal becomes a positional `?N` parameter.

mod filter;
mod join;
mod render;

pub use filter::{compile_filter, CompiledFilter};
pub use join::{compile_join, JoinClause, CHILD_ALIAS, PARENT_ALIAS};
pub use render::{quote_ident, SqlFragment};

use crate::errors::QueryError;
use crate::model::{EntityDescriptor, FieldDef, FieldKind, Literal};

/// Check that `literal` can be compared with values of `field`
fn check_literal(
    desc: &EntityDescriptor,
    field: &FieldDef,
    literal: &Literal,
) -> Result<(), QueryError> {
    let compatible = match (field.kind, literal) {
        (kind, Literal::Integer(_) | Literal::Float(_)) => kind.is_numeric(),
        (FieldKind::Text, Literal::Text(_)) => true,
        (FieldKind::Boolean, Literal::Boolean(_)) => true,
        _ => false,
    };
    if compatible {
        Ok(())
    } else {
        Err(QueryError::TypeMismatch {
            entity: desc.table().to_string(),
            field: field.name.clone(),
            expected: field.kind.name().to_string(),
            found: literal.type_name().to_string(),
        })
    }
}
