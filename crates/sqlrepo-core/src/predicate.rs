//! Predicate AST
//!
//! A small, serializable boolean expression over entity fields. It carries
//! no schema knowledge: field existence, literal typing and operator support
//! are checked when a predicate is compiled (see [`crate::compiler`]).
//!
//! ```
//! use sqlrepo_core::predicate::{eq, gt, Predicate};
//!
//! let p: Predicate = gt("amount", 5) & eq("label", "a");
//! assert_eq!(p.comparison_count(), 2);
//! ```

use crate::model::Literal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

/// Boolean connective joining two predicates
///
/// `Xor` can be expressed (and arrive over JSON) but neither compiler lowers
/// it; compiling it fails with `UnsupportedOperator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connective {
    And,
    Or,
    Xor,
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Connective::And => "AND",
            Connective::Or => "OR",
            Connective::Xor => "XOR",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Comparison {
        field: String,
        op: CompareOp,
        value: Literal,
    },
    Combinator {
        left: Box<Predicate>,
        op: Connective,
        right: Box<Predicate>,
    },
    /// No condition at all; compiles to `EmptyPredicate`
    #[default]
    Empty,
}

impl Predicate {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Literal>) -> Self {
        Predicate::Comparison {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn combine(left: Predicate, op: Connective, right: Predicate) -> Self {
        Predicate::Combinator {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        Self::combine(self, Connective::And, other)
    }

    pub fn or(self, other: Predicate) -> Self {
        Self::combine(self, Connective::Or, other)
    }

    pub fn xor(self, other: Predicate) -> Self {
        Self::combine(self, Connective::Xor, other)
    }

    /// Left-associative conjunction; `Empty` when `preds` is empty
    pub fn all(preds: impl IntoIterator<Item = Predicate>) -> Self {
        Self::fold(preds, Connective::And)
    }

    /// Left-associative disjunction; `Empty` when `preds` is empty
    pub fn any(preds: impl IntoIterator<Item = Predicate>) -> Self {
        Self::fold(preds, Connective::Or)
    }

    fn fold(preds: impl IntoIterator<Item = Predicate>, op: Connective) -> Self {
        preds
            .into_iter()
            .reduce(|acc, next| Self::combine(acc, op, next))
            .unwrap_or(Predicate::Empty)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Predicate::Empty)
    }

    pub fn comparison_count(&self) -> usize {
        match self {
            Predicate::Comparison { .. } => 1,
            Predicate::Combinator { left, right, .. } => {
                left.comparison_count() + right.comparison_count()
            }
            Predicate::Empty => 0,
        }
    }

    /// Field names in the order they appear
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Comparison { field, .. } => out.push(field),
            Predicate::Combinator { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Predicate::Empty => {}
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Comparison { field, op, value } => write!(f, "{} {} {}", field, op, value),
            Predicate::Combinator { left, op, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
            Predicate::Empty => write!(f, "<empty>"),
        }
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

pub fn eq(field: impl Into<String>, value: impl Into<Literal>) -> Predicate {
    Predicate::compare(field, CompareOp::Eq, value)
}

pub fn ne(field: impl Into<String>, value: impl Into<Literal>) -> Predicate {
    Predicate::compare(field, CompareOp::Ne, value)
}

pub fn gt(field: impl Into<String>, value: impl Into<Literal>) -> Predicate {
    Predicate::compare(field, CompareOp::Gt, value)
}

pub fn gte(field: impl Into<String>, value: impl Into<Literal>) -> Predicate {
    Predicate::compare(field, CompareOp::Gte, value)
}

pub fn lt(field: impl Into<String>, value: impl Into<Literal>) -> Predicate {
    Predicate::compare(field, CompareOp::Lt, value)
}

pub fn lte(field: impl Into<String>, value: impl Into<Literal>) -> Predicate {
    Predicate::compare(field, CompareOp::Lte, value)
}

pub fn and(left: Predicate, right: Predicate) -> Predicate {
    left.and(right)
}

pub fn or(left: Predicate, right: Predicate) -> Predicate {
    left.or(right)
}
