//! Literal and stored values
//!
//! Comparison follows SQLite semantics so that a filter evaluated in memory
//! selects exactly the rows the same filter selects when pushed into SQL:
//! integers and floats compare exactly by value, text compares byte-wise (the
//! BINARY collation), booleans are 0/1, and NULL never compares.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A constant a predicate compares against
///
/// Serialized untagged, so JSON `5`, `2.5`, `"a"` and `true` map directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Integer(_) => "integer",
            Literal::Float(_) => "float",
            Literal::Text(_) => "text",
            Literal::Boolean(_) => "boolean",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Text(s) => write!(f, "{:?}", s),
            Literal::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Integer(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Integer(i64::from(v))
    }
}

impl From<u32> for Literal {
    fn from(v: u32) -> Self {
        Literal::Integer(i64::from(v))
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Boolean(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Text(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Text(v)
    }
}

/// A stored cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Compare with a literal; `None` when either side is NULL or the shapes
    /// are not comparable
    pub fn compare(&self, literal: &Literal) -> Option<Ordering> {
        match (self, literal) {
            (Value::Null, _) => None,
            (Value::Integer(a), Literal::Integer(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Literal::Float(b)) => int_float_cmp(*a, *b),
            (Value::Float(a), Literal::Integer(b)) => int_float_cmp(*b, *a).map(Ordering::reverse),
            (Value::Float(a), Literal::Float(b)) => a.partial_cmp(b),
            (Value::Text(a), Literal::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Value::Boolean(a), Literal::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Exact ordering of an integer against a float, as SQLite orders them
///
/// `None` for NaN (SQLite binds NaN as NULL).
fn int_float_cmp(i: i64, r: f64) -> Option<Ordering> {
    // -2^63 is exact in f64; [-2^63, 2^63) truncates into i64 without loss
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    if r.is_nan() {
        return None;
    }
    if r < LOWER {
        return Some(Ordering::Greater);
    }
    if r >= -LOWER {
        return Some(Ordering::Less);
    }
    let whole = r.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(r - whole)),
        ordering => Some(ordering),
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Integer(v) => Value::Integer(v),
            Literal::Float(v) => Value::Float(v),
            Literal::Text(v) => Value::Text(v),
            Literal::Boolean(v) => Value::Boolean(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
        }
    }
}
