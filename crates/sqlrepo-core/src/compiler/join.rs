use super::check_literal;
use super::filter::{compile_filter, CompiledFilter};
use super::render::{quote_ident, SqlWriter};
use crate::errors::QueryError;
use crate::model::{EntityDescriptor, Literal};
use crate::predicate::{CompareOp, Connective, Predicate};

/// Alias of the parent table in join SQL
pub const PARENT_ALIAS: &str = "p";
/// Alias of the child table in join SQL
pub const CHILD_ALIAS: &str = "c";

/// A compiled two-entity join
///
/// `where_sql` references the parent through [`PARENT_ALIAS`]; `params[i]`
/// binds `?{i + 1}`. `tables` lists the parent table, then the child table.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub where_sql: String,
    pub params: Vec<Literal>,
    pub tables: Vec<String>,
    pub parent: EntityDescriptor,
    pub child: EntityDescriptor,
    pub foreign_key: String,
    /// The same predicate as a filter over the parent, for stores that
    /// evaluate joins without SQL
    pub parent_filter: CompiledFilter,
}

impl JoinClause {
    /// Full statement selecting the child's persisted columns
    pub fn select_sql(&self) -> String {
        let columns: Vec<String> = self
            .child
            .persisted_fields()
            .map(|f| format!("{}.{}", CHILD_ALIAS, quote_ident(&f.name)))
            .collect();
        format!(
            "SELECT {cols} FROM {child} AS {c} INNER JOIN {parent} AS {p} \
             ON {p}.{pid} = {c}.{fk} WHERE {filter} ORDER BY {c}.{cid}",
            cols = columns.join(", "),
            child = quote_ident(self.child.table()),
            parent = quote_ident(self.parent.table()),
            c = CHILD_ALIAS,
            p = PARENT_ALIAS,
            pid = quote_ident(self.parent.identifier()),
            fk = quote_ident(&self.foreign_key),
            filter = self.where_sql,
            cid = quote_ident(self.child.identifier()),
        )
    }
}

/// Compile a predicate over `parent` into a join from `child` on
/// `parent.identifier = child.foreign_key`
///
/// Combinator children that are themselves combinators are parenthesised,
/// so the rendered text keeps the tree's grouping.
///
/// # Errors
///
/// - `UnknownField` when `foreign_key` is not a persisted child field, or the
///   predicate names a field the parent does not persist
/// - `TypeMismatch` when the foreign key kind differs from the parent
///   identifier kind, or a literal does not fit its field
/// - `UnsupportedOperator` for any comparison other than equality, and for
///   the `Xor` connective
/// - `EmptyPredicate` when any subtree is `Predicate::Empty`
pub fn compile_join(
    predicate: &Predicate,
    parent: &EntityDescriptor,
    child: &EntityDescriptor,
    foreign_key: &str,
) -> Result<JoinClause, QueryError> {
    let fk = child.persisted_field(foreign_key)?;
    if let Some(pid) = parent.identifier_def() {
        if pid.kind != fk.kind {
            return Err(QueryError::TypeMismatch {
                entity: child.table().to_string(),
                field: foreign_key.to_string(),
                expected: pid.kind.name().to_string(),
                found: fk.kind.name().to_string(),
            });
        }
    }

    let mut writer = SqlWriter::new(Some(PARENT_ALIAS), 1);
    emit(&mut writer, predicate, parent)?;
    let fragment = writer.finish();
    let parent_filter = compile_filter(predicate, parent)?;

    Ok(JoinClause {
        where_sql: fragment.sql,
        params: fragment.params,
        tables: vec![parent.table().to_string(), child.table().to_string()],
        parent: parent.clone(),
        child: child.clone(),
        foreign_key: foreign_key.to_string(),
        parent_filter,
    })
}

fn emit(
    writer: &mut SqlWriter<'_>,
    predicate: &Predicate,
    parent: &EntityDescriptor,
) -> Result<(), QueryError> {
    match predicate {
        Predicate::Empty => Err(QueryError::EmptyPredicate),
        Predicate::Comparison { field, op, value } => {
            if *op != CompareOp::Eq {
                return Err(unsupported(op.sql()));
            }
            let def = parent.persisted_field(field)?;
            check_literal(parent, def, value)?;
            writer.comparison(field, *op, value);
            Ok(())
        }
        Predicate::Combinator { left, op, right } => {
            let keyword = match op {
                Connective::And => "AND",
                Connective::Or => "OR",
                Connective::Xor => return Err(unsupported("XOR")),
            };
            operand(writer, left, parent)?;
            writer.keyword(keyword);
            operand(writer, right, parent)
        }
    }
}

fn operand(
    writer: &mut SqlWriter<'_>,
    predicate: &Predicate,
    parent: &EntityDescriptor,
) -> Result<(), QueryError> {
    if matches!(predicate, Predicate::Combinator { .. }) {
        writer.open();
        emit(writer, predicate, parent)?;
        writer.close();
        Ok(())
    } else {
        emit(writer, predicate, parent)
    }
}

fn unsupported(operator: &str) -> QueryError {
    QueryError::UnsupportedOperator {
        operator: operator.to_string(),
        context: "join".to_string(),
    }
}
