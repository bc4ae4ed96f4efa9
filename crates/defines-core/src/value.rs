//! Host value model for user defines
//!
//! A define maps a name to a `Value`. Values come either from JSON
//! configuration (strings, numbers, booleans, null, arrays, objects) or from
//! programmatic callers, who can also hand over dates, regular expressions,
//! function source and ready-made AST nodes.

use serde::Deserialize;

use crate::ast::{Node, NodeKind};

/// A value that can be baked into the AST as a literal
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum Value {
    /// Absent value - literalizes to nothing
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    /// Plain object with entries in insertion order
    Object(Vec<(String, Value)>),
    RegExp { pattern: String, flags: String },
    /// Date as epoch milliseconds
    Date(i64),
    /// Function source text, e.g. `"(a) => a + 1"`
    Function(String),
    /// Pre-built AST node, passed through untouched
    Node(Box<Node>),
    /// A host value with no literal form (symbol, bigint, ...); the string names its type
    Unsupported(String),
}

impl Value {
    pub fn regexp(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        Value::RegExp {
            pattern: pattern.into(),
            flags: flags.into(),
        }
    }

    pub fn function(source: impl Into<String>) -> Self {
        Value::Function(source.into())
    }

    /// Build an object from `(key, value)` pairs
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Fold a literal node back into the value it denotes
    ///
    /// This is the inverse of [`crate::literalize`] for everything it emits.
    /// Returns `None` for nodes that are not literal-shaped.
    pub fn from_literal(node: &Node) -> Option<Value> {
        match &node.kind {
            NodeKind::StringLiteral { value } => Some(Value::String(value.clone())),
            NodeKind::NumericLiteral { value } => Some(Value::Number(*value)),
            NodeKind::BooleanLiteral { value } => Some(Value::Bool(*value)),
            NodeKind::NullLiteral => Some(Value::Null),
            NodeKind::RegExpLiteral { pattern, flags } => Some(Value::regexp(pattern, flags)),
            NodeKind::Identifier { name } if name == "undefined" => Some(Value::Undefined),
            NodeKind::Raw { source } => Some(Value::Function(source.clone())),
            NodeKind::NewExpression { callee, arguments }
                if callee.as_identifier() == Some("Date") && arguments.len() == 1 =>
            {
                match &arguments[0].kind {
                    NodeKind::NumericLiteral { value } => Some(Value::Date(*value as i64)),
                    _ => None,
                }
            }
            NodeKind::ArrayExpression { elements } => elements
                .iter()
                .map(|element| match element {
                    Some(element) => Value::from_literal(element),
                    None => Some(Value::Undefined),
                })
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            NodeKind::ObjectExpression { properties } => properties
                .iter()
                .map(|property| match &property.kind {
                    NodeKind::ObjectProperty {
                        key,
                        value,
                        computed: false,
                    } => {
                        let key = match &key.kind {
                            NodeKind::Identifier { name } => name.clone(),
                            NodeKind::StringLiteral { value } => value.clone(),
                            _ => return None,
                        };
                        Some((key, Value::from_literal(value)?))
                    }
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(Value::Object),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Value::Number(f),
                None => Value::Unsupported("number".to_string()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(Box::new(node))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Undefined, Into::into)
    }
}
