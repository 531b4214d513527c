use super::check_literal;
use super::render::{SqlFragment, SqlWriter};
use crate::errors::QueryError;
use crate::model::{EntityDescriptor, Literal, Record};
use crate::predicate::{CompareOp, Connective, Predicate};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Compare {
        field: String,
        op: CompareOp,
        value: Literal,
    },
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
}

/// A validated single-entity filter
///
/// Every field it references is a persisted field of `entity` and every
/// literal is comparable with its field, so evaluation cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    entity: String,
    root: Node,
}

impl CompiledFilter {
    /// Table of the entity this filter was compiled against
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Evaluate against a stored record
    pub fn matches(&self, record: &Record) -> bool {
        eval(&self.root, record)
    }

    /// Render as a parameterised `WHERE` fragment
    ///
    /// Columns are qualified with `alias` when given; placeholders are
    /// numbered from `first_param`.
    pub fn to_sql(&self, alias: Option<&str>, first_param: usize) -> SqlFragment {
        let mut writer = SqlWriter::new(alias, first_param);
        write_node(&mut writer, &self.root);
        writer.finish()
    }
}

/// Compile a predicate into a filter over one entity
///
/// # Errors
///
/// - `EmptyPredicate` when any subtree is `Predicate::Empty`
/// - `UnsupportedOperator` for the `Xor` connective
/// - `UnknownField` for fields the entity does not persist
/// - `TypeMismatch` when a literal cannot be compared with its field
pub fn compile_filter(
    predicate: &Predicate,
    desc: &EntityDescriptor,
) -> Result<CompiledFilter, QueryError> {
    Ok(CompiledFilter {
        entity: desc.table().to_string(),
        root: lower(predicate, desc)?,
    })
}

fn lower(predicate: &Predicate, desc: &EntityDescriptor) -> Result<Node, QueryError> {
    match predicate {
        Predicate::Empty => Err(QueryError::EmptyPredicate),
        Predicate::Comparison { field, op, value } => {
            let def = desc.persisted_field(field)?;
            check_literal(desc, def, value)?;
            Ok(Node::Compare {
                field: field.clone(),
                op: *op,
                value: value.clone(),
            })
        }
        Predicate::Combinator { left, op, right } => {
            let build: fn(Box<Node>, Box<Node>) -> Node = match op {
                Connective::And => Node::And,
                Connective::Or => Node::Or,
                Connective::Xor => {
                    return Err(QueryError::UnsupportedOperator {
                        operator: op.to_string(),
                        context: "filter".to_string(),
                    })
                }
            };
            let left = lower(left, desc)?;
            let right = lower(right, desc)?;
            Ok(build(Box::new(left), Box::new(right)))
        }
    }
}

fn eval(node: &Node, record: &Record) -> bool {
    match node {
        Node::Compare { field, op, value } => match record.get(field).compare(value) {
            Some(ordering) => holds(*op, ordering),
            None => false,
        },
        Node::And(l, r) => eval(l, record) && eval(r, record),
        Node::Or(l, r) => eval(l, record) || eval(r, record),
    }
}

fn holds(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Gte => ordering != Ordering::Less,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Lte => ordering != Ordering::Greater,
    }
}

fn write_node(writer: &mut SqlWriter<'_>, node: &Node) {
    match node {
        Node::Compare { field, op, value } => writer.comparison(field, *op, value),
        Node::And(l, r) => write_pair(writer, l, "AND", r),
        Node::Or(l, r) => write_pair(writer, l, "OR", r),
    }
}

fn write_pair(writer: &mut SqlWriter<'_>, left: &Node, keyword: &str, right: &Node) {
    write_operand(writer, left);
    writer.keyword(keyword);
    write_operand(writer, right);
}

fn write_operand(writer: &mut SqlWriter<'_>, node: &Node) {
    if matches!(node, Node::Compare { .. }) {
        write_node(writer, node);
    } else {
        writer.open();
        write_node(writer, node);
        writer.close();
    }
}
