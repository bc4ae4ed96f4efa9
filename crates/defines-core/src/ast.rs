//! AST - closed, self-describing expression tree
//!
//! The host parser lowers JavaScript-like source into these nodes and the host
//! code generator prints them back. The rewrite pass only ever reads node kinds
//! and children, and mutates the tree by replacing whole nodes.
//!
//! ## Shape
//!
//! - **Statements**: Program, blocks, declarations, `return`, `if`
//! - **Functions**: declarations, expressions, arrows, object/class methods
//! - **Expressions**: identifiers, literals, member chains, calls, operators
//! - **Containers**: array and object literals (also used as binding patterns)
//! - **Raw**: an opaque source fragment spliced verbatim by the code generator
//!
//! Nodes serialize as ESTree-flavoured JSON (`{"type": "Identifier", "name": "x"}`)
//! so a host in another process can exchange trees with us.

use serde::{Deserialize, Serialize};

// =============================================================================
// CORE AST TYPES
// =============================================================================

/// A single AST node: its kind plus the source span it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Absent in JSON for generated nodes
    #[serde(default = "Span::synthetic", skip_serializing_if = "Span::is_synthetic")]
    pub span: Span,
}

/// `var` / `let` / `const`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }
}

/// Object and class method flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    #[default]
    Method,
    Get,
    Set,
    Constructor,
}

impl MethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Method => "method",
            MethodKind::Get => "get",
            MethodKind::Set => "set",
            MethodKind::Constructor => "constructor",
        }
    }
}

/// A literal text segment of a template literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateElement {
    pub raw: String,
    #[serde(default = "Span::synthetic", skip_serializing_if = "Span::is_synthetic")]
    pub span: Span,
}

/// Node kinds - the closed set of syntax the rewrite pass understands
///
/// Object and array literals double as destructuring patterns; the position
/// they appear in decides whether they bind or read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum NodeKind {
    // -------------------------------------------------------------------------
    // Statements
    // -------------------------------------------------------------------------
    Program {
        body: Vec<Node>,
    },
    ExpressionStatement {
        expression: Box<Node>,
    },
    BlockStatement {
        body: Vec<Node>,
    },
    ReturnStatement {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        argument: Option<Box<Node>>,
    },
    IfStatement {
        test: Box<Node>,
        consequent: Box<Node>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alternate: Option<Box<Node>>,
    },
    VariableDeclaration {
        kind: DeclarationKind,
        declarations: Vec<Node>,
    },
    VariableDeclarator {
        id: Box<Node>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        init: Option<Box<Node>>,
    },

    // -------------------------------------------------------------------------
    // Functions and classes
    // -------------------------------------------------------------------------
    FunctionDeclaration {
        id: Box<Node>,
        params: Vec<Node>,
        body: Box<Node>,
    },
    FunctionExpression {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Box<Node>>,
        params: Vec<Node>,
        body: Box<Node>,
    },
    ArrowFunctionExpression {
        params: Vec<Node>,
        body: Box<Node>,
    },
    ClassDeclaration {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Box<Node>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        super_class: Option<Box<Node>>,
        body: Vec<Node>,
    },
    ClassMethod {
        #[serde(default)]
        kind: MethodKind,
        key: Box<Node>,
        #[serde(default)]
        computed: bool,
        #[serde(default)]
        is_static: bool,
        params: Vec<Node>,
        body: Box<Node>,
    },

    // -------------------------------------------------------------------------
    // Leaves
    // -------------------------------------------------------------------------
    Identifier {
        name: String,
    },
    ThisExpression,
    StringLiteral {
        value: String,
    },
    NumericLiteral {
        value: f64,
    },
    BooleanLiteral {
        value: bool,
    },
    NullLiteral,
    RegExpLiteral {
        pattern: String,
        #[serde(default)]
        flags: String,
    },
    TemplateLiteral {
        quasis: Vec<TemplateElement>,
        expressions: Vec<Node>,
    },
    TaggedTemplateExpression {
        tag: Box<Node>,
        quasi: Box<Node>,
    },

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        #[serde(default)]
        computed: bool,
    },
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    NewExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    UnaryExpression {
        operator: String,
        #[serde(default = "default_prefix")]
        prefix: bool,
        argument: Box<Node>,
    },
    UpdateExpression {
        operator: String,
        #[serde(default)]
        prefix: bool,
        argument: Box<Node>,
    },
    BinaryExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    AssignmentExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    ConditionalExpression {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    SpreadElement {
        argument: Box<Node>,
    },
    AssignmentPattern {
        left: Box<Node>,
        right: Box<Node>,
    },

    // -------------------------------------------------------------------------
    // Containers
    // -------------------------------------------------------------------------
    /// `[a, , b]` - `None` entries are holes
    ArrayExpression {
        elements: Vec<Option<Node>>,
    },
    ObjectExpression {
        properties: Vec<Node>,
    },
    ObjectProperty {
        key: Box<Node>,
        value: Box<Node>,
        #[serde(default)]
        computed: bool,
    },
    ObjectMethod {
        #[serde(default)]
        kind: MethodKind,
        key: Box<Node>,
        #[serde(default)]
        computed: bool,
        params: Vec<Node>,
        body: Box<Node>,
    },

    /// Source text expanded by the host's fragment facility
    Raw {
        source: String,
    },
}

fn default_prefix() -> bool {
    true
}

impl Node {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    /// Create a node with a synthetic span
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            span: Span::synthetic(),
        }
    }

    /// Attach a source span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn program(body: Vec<Node>) -> Self {
        Self::new(NodeKind::Program { body })
    }

    pub fn expr_stmt(expression: Node) -> Self {
        Self::new(NodeKind::ExpressionStatement {
            expression: Box::new(expression),
        })
    }

    pub fn block(body: Vec<Node>) -> Self {
        Self::new(NodeKind::BlockStatement { body })
    }

    /// `kind id = init;` with a single declarator
    pub fn var_decl(kind: DeclarationKind, id: Node, init: Option<Node>) -> Self {
        let declarator = Self::new(NodeKind::VariableDeclarator {
            id: Box::new(id),
            init: init.map(Box::new),
        });
        Self::new(NodeKind::VariableDeclaration {
            kind,
            declarations: vec![declarator],
        })
    }

    pub fn function_decl(id: Node, params: Vec<Node>, body: Vec<Node>) -> Self {
        Self::new(NodeKind::FunctionDeclaration {
            id: Box::new(id),
            params,
            body: Box::new(Self::block(body)),
        })
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Identifier { name: name.into() })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(NodeKind::StringLiteral {
            value: value.into(),
        })
    }

    pub fn number(value: f64) -> Self {
        Self::new(NodeKind::NumericLiteral { value })
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(NodeKind::BooleanLiteral { value })
    }

    pub fn null() -> Self {
        Self::new(NodeKind::NullLiteral)
    }

    pub fn regex(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        Self::new(NodeKind::RegExpLiteral {
            pattern: pattern.into(),
            flags: flags.into(),
        })
    }

    /// `object.property` (non-computed)
    pub fn member(object: Node, property: Node) -> Self {
        Self::new(NodeKind::MemberExpression {
            object: Box::new(object),
            property: Box::new(property),
            computed: false,
        })
    }

    /// `object[property]`
    pub fn computed_member(object: Node, property: Node) -> Self {
        Self::new(NodeKind::MemberExpression {
            object: Box::new(object),
            property: Box::new(property),
            computed: true,
        })
    }

    /// Build a member chain from a dotted path: `"a.b.c"` -> `a.b.c`
    pub fn dotted(path: &str) -> Self {
        let mut segments = path.split('.');
        let head = Self::ident(segments.next().unwrap_or_default());
        segments.fold(head, |object, segment| {
            Self::member(object, Self::ident(segment))
        })
    }

    pub fn call(callee: Node, arguments: Vec<Node>) -> Self {
        Self::new(NodeKind::CallExpression {
            callee: Box::new(callee),
            arguments,
        })
    }

    /// `new callee(arguments)`
    pub fn construct(callee: Node, arguments: Vec<Node>) -> Self {
        Self::new(NodeKind::NewExpression {
            callee: Box::new(callee),
            arguments,
        })
    }

    pub fn array(elements: Vec<Option<Node>>) -> Self {
        Self::new(NodeKind::ArrayExpression { elements })
    }

    pub fn object(properties: Vec<Node>) -> Self {
        Self::new(NodeKind::ObjectExpression { properties })
    }

    /// Non-computed `key: value`
    pub fn property(key: Node, value: Node) -> Self {
        Self::new(NodeKind::ObjectProperty {
            key: Box::new(key),
            value: Box::new(value),
            computed: false,
        })
    }

    pub fn raw(source: impl Into<String>) -> Self {
        Self::new(NodeKind::Raw {
            source: source.into(),
        })
    }

    // =========================================================================
    // PREDICATES / EXTRACTORS
    // =========================================================================

    /// Identifier name, if this is an identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// String literal value, if this is a string literal
    pub fn as_string_literal(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::StringLiteral { value } => Some(value),
            _ => None,
        }
    }

    pub fn is_member(&self) -> bool {
        matches!(self.kind, NodeKind::MemberExpression { .. })
    }

    /// Source start offset, used to order template pieces
    pub fn start(&self) -> usize {
        self.span.start
    }
}

/// Is `name` usable as a bare identifier (object key, binding name)?
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

// =============================================================================
// SOURCE SPAN
// =============================================================================

/// Source span for source maps and template ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of start
    pub start: usize,
    /// Byte offset of end
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a synthetic span (for generated nodes)
    ///
    /// Synthetic spans use usize::MAX to mark that they don't correspond to
    /// actual source text.
    pub fn synthetic() -> Self {
        Self {
            start: usize::MAX,
            end: usize::MAX,
        }
    }

    /// Check if this span is synthetic (generated, not from source)
    pub fn is_synthetic(&self) -> bool {
        self.start == usize::MAX && self.end == usize::MAX
    }
}
