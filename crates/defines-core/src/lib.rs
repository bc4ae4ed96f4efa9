//! defines-core: AST and value plumbing for build-defines
//!
//! This crate contains the pure pieces with NO filesystem access:
//! - AST types (Node, NodeKind, Span, TemplateElement)
//! - Host value model for user-supplied defines
//! - Expression stringifier (canonical text used as lookup keys)
//! - Value literalizer (value -> literal AST node)
//!
//! Manifest discovery and the identifier rewrite pass live in the
//! `build-defines` crate since they touch the filesystem.

pub mod ast;
pub mod literal;
pub mod stringify;
pub mod value;

// Re-export commonly used types
pub use ast::{
    is_identifier_name, DeclarationKind, MethodKind, Node, NodeKind, Span, TemplateElement,
};
pub use literal::literalize;
pub use stringify::stringify;
pub use value::Value;
