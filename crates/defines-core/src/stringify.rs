//! Expression stringifier
//!
//! Turns a node into a canonical piece of text. The output is only ever used as
//! a lookup key (`a.b.c`) or an equality probe (is this call's callee the
//! identifier we are looking at?), never parsed back, so the rendering is
//! deliberately lossy: string literals are unquoted and kinds without a
//! rendering collapse to the empty string.

use crate::ast::{MethodKind, Node, NodeKind};

/// Render a node as canonical text
pub fn stringify(node: &Node) -> String {
    match &node.kind {
        NodeKind::Identifier { name } => name.clone(),
        NodeKind::ThisExpression => "this".to_string(),
        NodeKind::MemberExpression { .. } => member_to_string(node),

        NodeKind::StringLiteral { value } => value.clone(),
        NodeKind::NumericLiteral { value } => format_number(*value),
        NodeKind::BooleanLiteral { value } => value.to_string(),
        NodeKind::NullLiteral => "null".to_string(),
        NodeKind::RegExpLiteral { pattern, flags } => format!("/{}/{}", pattern, flags),

        NodeKind::SpreadElement { argument } => format!("...{}", stringify(argument)),
        NodeKind::BinaryExpression {
            operator,
            left,
            right,
        }
        | NodeKind::LogicalExpression {
            operator,
            left,
            right,
        } => format!("{} {} {}", stringify(left), operator, stringify(right)),
        NodeKind::UnaryExpression {
            operator,
            prefix,
            argument,
        }
        | NodeKind::UpdateExpression {
            operator,
            prefix,
            argument,
        } => {
            if *prefix {
                format!("{}{}", operator, stringify(argument))
            } else {
                format!("{}{}", stringify(argument), operator)
            }
        }
        NodeKind::ConditionalExpression {
            test,
            consequent,
            alternate,
        } => format!(
            "{} ? {} : {}",
            stringify(test),
            stringify(consequent),
            stringify(alternate)
        ),
        NodeKind::CallExpression { callee, arguments } => {
            format!("{}({})", stringify(callee), join(arguments, ","))
        }
        NodeKind::NewExpression { callee, arguments } => {
            format!("new {}({})", stringify(callee), join(arguments, ","))
        }

        NodeKind::VariableDeclarator { id, init } => match init {
            Some(init) => format!("{} = {}", stringify(id), stringify(init)),
            None => stringify(id),
        },
        NodeKind::VariableDeclaration { kind, declarations } => {
            format!("{} {};", kind.as_str(), join(declarations, ","))
        }
        NodeKind::ExpressionStatement { expression } => format!("{};", stringify(expression)),
        NodeKind::BlockStatement { body } => format!("{{{}}}", join(body, "")),

        NodeKind::TemplateLiteral {
            quasis,
            expressions,
        } => template_to_string(quasis, expressions),
        NodeKind::TaggedTemplateExpression { tag, quasi } => {
            format!("{}{}", stringify(tag), stringify(quasi))
        }
        NodeKind::FunctionExpression { id, params, body } => format!(
            "function {}({}){}",
            id.as_deref().map(stringify).unwrap_or_default(),
            join(params, ","),
            stringify(body)
        ),
        NodeKind::AssignmentPattern { left, right } => {
            format!("{} = {}", stringify(left), stringify(right))
        }

        NodeKind::ArrayExpression { elements } => {
            let rendered: Vec<String> = elements
                .iter()
                .map(|e| e.as_ref().map(stringify).unwrap_or_default())
                .collect();
            format!("[{}]", rendered.join(", "))
        }
        NodeKind::ObjectProperty {
            key,
            value,
            computed,
        } => {
            if *computed {
                format!("[{}]: {}", stringify(key), stringify(value))
            } else {
                format!("{}: {}", stringify(key), stringify(value))
            }
        }
        NodeKind::ObjectMethod {
            kind,
            key,
            params,
            body,
            ..
        } => {
            let prefix = match kind {
                MethodKind::Method => String::new(),
                other => format!("{} ", other.as_str()),
            };
            format!(
                "{}{}({}){}",
                prefix,
                stringify(key),
                join(params, ", "),
                stringify(body)
            )
        }
        NodeKind::ObjectExpression { properties } => format!("{{{}}}", join(properties, ", ")),

        _ => String::new(),
    }
}

fn join(nodes: &[Node], separator: &str) -> String {
    nodes
        .iter()
        .map(stringify)
        .collect::<Vec<_>>()
        .join(separator)
}

/// `a.b.c`, with bracket form when the property is itself a member chain
fn member_to_string(node: &Node) -> String {
    let NodeKind::MemberExpression {
        object, property, ..
    } = &node.kind
    else {
        return stringify(node);
    };

    let object_text = match &object.kind {
        NodeKind::MemberExpression { .. } => member_to_string(object),
        _ => stringify(object),
    };
    let property_text = stringify(property);

    if property.is_member() {
        format!("{}[{}]", object_text, property_text)
    } else if object_text.is_empty() {
        property_text
    } else {
        format!("{}.{}", object_text, property_text)
    }
}

/// Interleave quasis and `${expr}` placeholders in source order
///
/// The two groups are tracked separately in the tree, so they are merged by
/// span start before concatenation.
fn template_to_string(quasis: &[crate::ast::TemplateElement], expressions: &[Node]) -> String {
    enum Piece<'a> {
        Text(&'a str),
        Expr(&'a Node),
    }

    let mut pieces: Vec<(usize, Piece)> = expressions
        .iter()
        .map(|e| (e.start(), Piece::Expr(e)))
        .chain(quasis.iter().map(|q| (q.span.start, Piece::Text(&q.raw))))
        .collect();
    pieces.sort_by_key(|(start, _)| *start);

    let body: String = pieces
        .into_iter()
        .map(|(_, piece)| match piece {
            Piece::Text(raw) => raw.to_string(),
            Piece::Expr(expr) => format!("${{{}}}", stringify(expr)),
        })
        .collect();
    format!("`{}`", body)
}

/// Shortest round-trip form, with exponent notation outside `[1e-6, 1e21)`
/// (`1e+21`, `1.5e-7`)
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        // -0 prints as 0
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{}", value);
    }
    let exponential = format!("{:e}", value);
    match exponential.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => exponential,
    }
}
