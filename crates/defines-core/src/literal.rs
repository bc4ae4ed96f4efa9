//! Value literalizer
//!
//! Converts a [`Value`] into an equivalent literal AST node. `None` means
//! "omit": the value has no representation and the caller should leave the
//! slot empty (array entries and object properties are dropped).

use crate::ast::{is_identifier_name, Node};
use crate::value::Value;

/// Convert a value into a literal node
pub fn literalize(value: &Value) -> Option<Node> {
    match value {
        Value::Node(node) => Some((**node).clone()),
        Value::Undefined => None,
        Value::Array(items) => Some(array_literal(items)),
        Value::String(s) => Some(Node::string(s.clone())),
        Value::Bool(b) => Some(Node::boolean(*b)),
        Value::Number(n) => Some(Node::number(*n)),
        Value::Null => Some(Node::null()),
        Value::RegExp { pattern, flags } => Some(Node::regex(pattern.clone(), flags.clone())),
        Value::Date(millis) => Some(Node::construct(
            Node::ident("Date"),
            vec![Node::number(*millis as f64)],
        )),
        Value::Function(source) => Some(Node::raw(source.clone())),
        Value::Object(entries) => Some(object_literal(entries)),
        Value::Unsupported(_) => Some(Node::ident("undefined")),
    }
}

/// `[a, b, ...]` from the entries that literalize
fn array_literal(items: &[Value]) -> Node {
    Node::array(items.iter().filter_map(literalize).map(Some).collect())
}

/// `{k: v, ...}`, dropping entries that literalize to nothing
fn object_literal(entries: &[(String, Value)]) -> Node {
    let properties = entries
        .iter()
        .filter_map(|(key, value)| {
            let value = literalize(value)?;
            Some(Node::property(property_key(key), value))
        })
        .collect();
    Node::object(properties)
}

fn property_key(key: &str) -> Node {
    if is_identifier_name(key) {
        Node::ident(key)
    } else {
        Node::string(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::stringify::stringify;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_object_survives_literalization() {
        let value = Value::object([
            ("a", Value::Number(1.0)),
            (
                "b",
                Value::Array(vec![Value::Number(1.0), Value::from("x"), Value::Null]),
            ),
        ]);

        let node = literalize(&value).unwrap();
        assert_eq!(stringify(&node), "{a: 1, b: [1, x, null]}");
        assert_eq!(Value::from_literal(&node), Some(value));
    }

    #[test]
    fn test_undefined_is_omitted() {
        assert_eq!(literalize(&Value::Undefined), None);

        let array = literalize(&Value::Array(vec![
            Value::Number(1.0),
            Value::Undefined,
            Value::Number(3.0),
        ]))
        .unwrap();
        assert_eq!(
            array,
            Node::array(vec![Some(Node::number(1.0)), Some(Node::number(3.0))])
        );

        let object = literalize(&Value::object([
            ("keep", Value::Bool(true)),
            ("drop", Value::Undefined),
        ]))
        .unwrap();
        assert_eq!(
            object,
            Node::object(vec![Node::property(Node::ident("keep"), Node::boolean(true))])
        );
    }

    #[test]
    fn test_scalars() {
        assert_eq!(literalize(&Value::from("hi")), Some(Node::string("hi")));
        assert_eq!(literalize(&Value::Bool(true)), Some(Node::boolean(true)));
        assert_eq!(literalize(&Value::from(7i64)), Some(Node::number(7.0)));
        assert_eq!(literalize(&Value::Null), Some(Node::null()));
        assert_eq!(
            literalize(&Value::regexp("\\d+", "g")),
            Some(Node::regex("\\d+", "g"))
        );
    }

    #[test]
    fn test_date_becomes_constructor_call() {
        let node = literalize(&Value::Date(1_700_000_000_000)).unwrap();
        assert_eq!(stringify(&node), "new Date(1700000000000)");
        assert_eq!(Value::from_literal(&node), Some(Value::Date(1_700_000_000_000)));
    }

    #[test]
    fn test_function_becomes_raw_fragment() {
        let node = literalize(&Value::function("(a) => a * 2")).unwrap();
        assert!(matches!(&node.kind, NodeKind::Raw { source } if source == "(a) => a * 2"));
    }

    #[test]
    fn test_node_passes_through() {
        let original = Node::dotted("window.config");
        assert_eq!(literalize(&Value::from(original.clone())), Some(original));
    }

    #[test]
    fn test_unsupported_becomes_undefined_reference() {
        let node = literalize(&Value::Unsupported("symbol".to_string())).unwrap();
        assert_eq!(node.as_identifier(), Some("undefined"));
    }

    #[test]
    fn test_non_identifier_keys_are_quoted() {
        let node = literalize(&Value::object([("data-id", Value::Number(1.0))])).unwrap();
        match &node.kind {
            NodeKind::ObjectExpression { properties } => match &properties[0].kind {
                NodeKind::ObjectProperty { key, .. } => {
                    assert_eq!(key.as_string_literal(), Some("data-id"));
                }
                other => panic!("Expected ObjectProperty, got {:?}", other),
            },
            other => panic!("Expected ObjectExpression, got {:?}", other),
        }
    }
}
