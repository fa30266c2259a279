//! Runtime values of the query language.

use crate::error::Error;
use core::fmt;

mod node_set;

pub use node_set::NodeSet;

/// Runtime type tag of a [`Value`]. `Any` never describes a value; it is the
/// wildcard used in function signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Number,
    String,
    Boolean,
    NodeSet,
    Any,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::NodeSet => "node-set",
            ValueType::Any => "any",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value<N> {
    Number(f64),
    String(String),
    Boolean(bool),
    NodeSet(NodeSet<N>),
}

impl<N> Value<N> {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Boolean(_) => ValueType::Boolean,
            Value::NodeSet(_) => ValueType::NodeSet,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_node_set(&self) -> Option<&NodeSet<N>> {
        match self {
            Value::NodeSet(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_node_set(self) -> Result<NodeSet<N>, Error> {
        match self {
            Value::NodeSet(s) => Ok(s),
            other => Err(Error::not_a_node_set(other.value_type())),
        }
    }

    /// The nodes of a node-set value, in document order.
    pub fn into_nodes(self) -> Result<Vec<N>, Error> {
        self.into_node_set().map(NodeSet::into_vec)
    }
}

impl<N> From<f64> for Value<N> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl<N> From<bool> for Value<N> {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<N> From<String> for Value<N> {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<N> From<&str> for Value<N> {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<N> From<NodeSet<N>> for Value<N> {
    fn from(s: NodeSet<N>) -> Self {
        Value::NodeSet(s)
    }
}

/// XPath `number(string)`: optional whitespace around an optionally negated
/// decimal literal. Anything else, including exponents, is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
    let digits = t.strip_prefix('-').unwrap_or(t);
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    let well_formed = int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
        && !(int.is_empty() && frac.is_empty());
    if well_formed { t.parse().unwrap_or(f64::NAN) } else { f64::NAN }
}

/// XPath `string(number)`.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n == 0.0 {
        "0".into()
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_from_strings() {
        assert_eq!(string_to_number(" 12 "), 12.0);
        assert_eq!(string_to_number("-3.5"), -3.5);
        assert_eq!(string_to_number(".5"), 0.5);
        assert_eq!(string_to_number("7."), 7.0);
        for bad in ["", "-", ".", "1e3", "12abc", "+1", "--1"] {
            assert!(string_to_number(bad).is_nan(), "{bad}");
        }
    }

    #[test]
    fn strings_from_numbers() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.25), "0.25");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }
}
