//! Identifier resolver - the rewrite pass
//!
//! One depth-first, pre-order walk over a file's AST. Every identifier in a
//! read position is resolved to a name and checked against the user defines
//! and the built-ins; a match replaces the whole node with a literal.
//!
//! ## Positions that are never rewritten
//!
//! - declared names of functions and classes, and their parameters
//! - non-computed keys of object properties and methods
//! - names bound by variable declarators and destructuring patterns
//! - assignment and update targets
//! - identifier callees (`__filename__()`), except `__packageversion__`
//!
//! ## Member chains
//!
//! `a.b.c` resolves as the dotted name `a.b.c` and a match replaces the whole
//! chain. The object identifier `a` is still checked on its own, so
//! `__filename__.length` becomes `"/src/a.js".length`.
//!
//! ## Priority
//!
//! 1. User define with the resolved name (if it has a literal form)
//! 2. Enabled built-in whose inputs are available
//! 3. Leave untouched

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use defines_core::{literalize, stringify, Node, NodeKind};
use serde::Serialize;
use tracing::{debug, warn};

use crate::builtins::{file_hash, BuiltIn};
use crate::cache::{ConstCacheResolver, FileConstCache};
use crate::config::DefineOptions;
use crate::error::Result;

/// Replacements performed on one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    /// Total replaced nodes
    pub replaced: usize,
    /// Replacements per resolved name
    pub by_name: BTreeMap<String, usize>,
}

impl TransformReport {
    /// Replacements for a resolved name
    pub fn count(&self, name: &str) -> usize {
        self.by_name.get(name).copied().unwrap_or(0)
    }

    fn record(&mut self, name: &str) {
        self.replaced += 1;
        *self.by_name.entry(name.to_string()).or_insert(0) += 1;
    }
}

/// Rewrite pass over a single file
pub struct IdentifierResolver<'a> {
    options: &'a DefineOptions,
    cache: &'a FileConstCache,
    packages: &'a ConstCacheResolver,
    file: &'a Path,
    report: TransformReport,
}

impl<'a> IdentifierResolver<'a> {
    pub fn new(
        options: &'a DefineOptions,
        cache: &'a FileConstCache,
        packages: &'a ConstCacheResolver,
        file: &'a Path,
    ) -> Self {
        Self {
            options,
            cache,
            packages,
            file,
            report: TransformReport::default(),
        }
    }

    /// Walk `root` once, replacing in place
    pub fn run(mut self, root: &mut Node) -> Result<TransformReport> {
        self.visit(root)?;
        Ok(self.report)
    }

    // =========================================================================
    // TRAVERSAL
    // =========================================================================

    fn visit(&mut self, node: &mut Node) -> Result<()> {
        match node.kind {
            NodeKind::Identifier { .. } => {
                self.visit_identifier(node);
                Ok(())
            }
            NodeKind::MemberExpression { .. } => self.visit_member(node),
            NodeKind::CallExpression { .. } => self.visit_call(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_all(&mut self, nodes: &mut [Node]) -> Result<()> {
        for node in nodes {
            self.visit(node)?;
        }
        Ok(())
    }

    fn visit_opt(&mut self, node: &mut Option<Box<Node>>) -> Result<()> {
        match node {
            Some(node) => self.visit(node),
            None => Ok(()),
        }
    }

    fn visit_children(&mut self, node: &mut Node) -> Result<()> {
        match &mut node.kind {
            NodeKind::Program { body } | NodeKind::BlockStatement { body } => self.visit_all(body),
            NodeKind::ExpressionStatement { expression } => self.visit(expression),
            NodeKind::ReturnStatement { argument } => self.visit_opt(argument),
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            } => {
                self.visit(test)?;
                self.visit(consequent)?;
                self.visit_opt(alternate)
            }
            NodeKind::VariableDeclaration { declarations, .. } => self.visit_all(declarations),
            NodeKind::VariableDeclarator { id, init } => {
                self.visit_binding(id)?;
                self.visit_opt(init)
            }

            // Declared names are bindings, not reads
            NodeKind::FunctionDeclaration { params, body, .. }
            | NodeKind::FunctionExpression { params, body, .. }
            | NodeKind::ArrowFunctionExpression { params, body } => {
                self.visit_params(params)?;
                self.visit(body)
            }
            NodeKind::ClassDeclaration {
                super_class, body, ..
            } => {
                self.visit_opt(super_class)?;
                self.visit_all(body)
            }
            NodeKind::ClassMethod {
                key,
                computed,
                params,
                body,
                ..
            }
            | NodeKind::ObjectMethod {
                key,
                computed,
                params,
                body,
                ..
            } => {
                if *computed {
                    self.visit(key)?;
                }
                self.visit_params(params)?;
                self.visit(body)
            }
            NodeKind::ObjectProperty {
                key,
                value,
                computed,
            } => {
                if *computed {
                    self.visit(key)?;
                }
                self.visit(value)
            }

            NodeKind::TemplateLiteral { expressions, .. } => self.visit_all(expressions),
            NodeKind::TaggedTemplateExpression { tag, quasi } => {
                self.visit(tag)?;
                self.visit(quasi)
            }
            NodeKind::NewExpression { callee, arguments } => {
                self.visit(callee)?;
                self.visit_all(arguments)
            }
            NodeKind::UnaryExpression { argument, .. } | NodeKind::SpreadElement { argument } => {
                self.visit(argument)
            }
            NodeKind::UpdateExpression { argument, .. } => self.visit_target(argument),
            NodeKind::BinaryExpression { left, right, .. }
            | NodeKind::LogicalExpression { left, right, .. } => {
                self.visit(left)?;
                self.visit(right)
            }
            NodeKind::AssignmentExpression { left, right, .. } => {
                self.visit_target(left)?;
                self.visit(right)
            }
            NodeKind::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                self.visit(test)?;
                self.visit(consequent)?;
                self.visit(alternate)
            }
            NodeKind::AssignmentPattern { left, right } => {
                self.visit_binding(left)?;
                self.visit(right)
            }
            NodeKind::ArrayExpression { elements } => {
                for element in elements.iter_mut().flatten() {
                    self.visit(element)?;
                }
                Ok(())
            }
            NodeKind::ObjectExpression { properties } => self.visit_all(properties),

            // Handled by their own visitors, or leaves
            NodeKind::Identifier { .. }
            | NodeKind::MemberExpression { .. }
            | NodeKind::CallExpression { .. }
            | NodeKind::ThisExpression
            | NodeKind::StringLiteral { .. }
            | NodeKind::NumericLiteral { .. }
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::NullLiteral
            | NodeKind::RegExpLiteral { .. }
            | NodeKind::Raw { .. } => Ok(()),
        }
    }

    fn visit_params(&mut self, params: &mut [Node]) -> Result<()> {
        for param in params {
            self.visit_binding(param)?;
        }
        Ok(())
    }

    /// A binding position: names are skipped, defaults and computed keys are reads
    fn visit_binding(&mut self, target: &mut Node) -> Result<()> {
        match &mut target.kind {
            NodeKind::Identifier { .. } => Ok(()),
            NodeKind::AssignmentPattern { left, right } => {
                self.visit_binding(left)?;
                self.visit(right)
            }
            NodeKind::SpreadElement { argument } => self.visit_binding(argument),
            NodeKind::ArrayExpression { elements } => {
                for element in elements.iter_mut().flatten() {
                    self.visit_binding(element)?;
                }
                Ok(())
            }
            NodeKind::ObjectExpression { properties } => {
                for property in properties {
                    match &mut property.kind {
                        NodeKind::ObjectProperty {
                            key,
                            value,
                            computed,
                        } => {
                            if *computed {
                                self.visit(key)?;
                            }
                            self.visit_binding(value)?;
                        }
                        _ => self.visit_binding(property)?,
                    }
                }
                Ok(())
            }
            NodeKind::MemberExpression { .. } => self.visit_target(target),
            _ => self.visit(target),
        }
    }

    /// An assignment or update target: the written name itself is skipped
    fn visit_target(&mut self, target: &mut Node) -> Result<()> {
        match &mut target.kind {
            NodeKind::Identifier { .. } => Ok(()),
            NodeKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                self.visit(object)?;
                if *computed {
                    self.visit(property)?;
                }
                Ok(())
            }
            _ => self.visit_binding(target),
        }
    }

    fn visit_identifier(&mut self, node: &mut Node) {
        let Some(name) = node.as_identifier().map(str::to_owned) else {
            return;
        };
        if let Some(replacement) = self.rule(&name) {
            self.replace(node, &name, replacement);
        }
    }

    /// Member chain: objects are ordinary reads, the trailing identifier names the chain
    ///
    /// The walk follows properties that are themselves member expressions
    /// (`x[a.b]`), so the dotted name spans every level and a match replaces
    /// the outermost node.
    fn visit_member(&mut self, node: &mut Node) -> Result<()> {
        let mut cursor: &mut Node = node;
        let tail = loop {
            let NodeKind::MemberExpression {
                object,
                property,
                computed,
            } = &mut cursor.kind
            else {
                break None;
            };
            self.visit(object)?;
            if property.is_member() {
                cursor = &mut **property;
                continue;
            }
            match &property.kind {
                NodeKind::Identifier { name } if !*computed => break Some(name.clone()),
                _ => {
                    self.visit(property)?;
                    break None;
                }
            }
        };

        let Some(tail) = tail else {
            return Ok(());
        };
        let dotted = dotted_name(node, &tail);
        if let Some(replacement) = self.rule(&dotted) {
            self.replace(node, &dotted, replacement);
        }
        Ok(())
    }

    fn visit_call(&mut self, node: &mut Node) -> Result<()> {
        let special = match &node.kind {
            NodeKind::CallExpression { callee, arguments } => match callee.as_identifier() {
                Some(name) => self.call_replacement(name, arguments)?,
                None => None,
            },
            _ => return Ok(()),
        };
        if let Some((name, replacement)) = special {
            self.replace(node, &name, replacement);
            return Ok(());
        }

        let NodeKind::CallExpression { callee, arguments } = &mut node.kind else {
            return Ok(());
        };
        let callee_text = stringify(callee);
        if !matches!(callee.kind, NodeKind::Identifier { .. }) {
            self.visit(callee)?;
        }
        for argument in arguments.iter_mut() {
            // An argument spelled like the callee is treated like the callee
            if argument.as_identifier() == Some(callee_text.as_str()) {
                continue;
            }
            self.visit(argument)?;
        }
        Ok(())
    }

    // =========================================================================
    // RULES
    // =========================================================================

    /// `__packageversion__("pkg")` and `__packageversion__()`
    ///
    /// The dependency form bypasses the rule table, toggles included. The
    /// bare call is the plain built-in and honours its toggle.
    fn call_replacement(&self, name: &str, arguments: &[Node]) -> Result<Option<(String, Node)>> {
        if BuiltIn::from_identifier(name) != Some(BuiltIn::PackageVersion) {
            return Ok(None);
        }

        match arguments {
            [] => {
                if !self.options.built_ins.is_enabled(BuiltIn::PackageVersion) {
                    return Ok(None);
                }
                Ok(self
                    .built_in_literal(BuiltIn::PackageVersion)
                    .map(|version| (name.to_string(), version)))
            }
            [argument] => {
                let Some(package) = argument.as_string_literal() else {
                    return Ok(None);
                };
                let version = self
                    .packages
                    .resolve_package(package, self.file)?
                    .and_then(|pkg| pkg.version.clone());
                if version.is_none() {
                    warn!(
                        "Cannot resolve version of package '{}' from {}",
                        package,
                        self.file.display()
                    );
                }
                Ok(Some((name.to_string(), Node::string(version.unwrap_or_default()))))
            }
            _ => Ok(None),
        }
    }

    /// Literal for a resolved name, if any rule applies
    fn rule(&self, name: &str) -> Option<Node> {
        if let Some(node) = self.options.defines.get(name).and_then(literalize) {
            return Some(node);
        }

        let built_in = BuiltIn::from_identifier(name)?;
        if !self.options.built_ins.is_enabled(built_in) {
            return None;
        }
        self.built_in_literal(built_in)
    }

    fn built_in_literal(&self, built_in: BuiltIn) -> Option<Node> {
        let cache = self.cache;
        if built_in.requires_manifest() && cache.is_empty() {
            return None;
        }
        match built_in {
            BuiltIn::Filename => cache.filename.clone().map(Node::string),
            BuiltIn::Dirname => cache.dirname.clone().map(Node::string),
            BuiltIn::Now => Some(Node::string(cache.now.clone())),
            BuiltIn::Timestamp => Some(Node::number(Utc::now().timestamp_millis() as f64)),
            BuiltIn::Filehash => {
                let filename = cache.filename.as_deref()?;
                let package = cache.pkg.as_ref().and_then(|pkg| pkg.name.as_deref());
                Some(Node::string(file_hash(filename, package)))
            }
            BuiltIn::PackageName => cache
                .pkg
                .as_ref()
                .and_then(|pkg| pkg.name.clone())
                .map(Node::string),
            BuiltIn::PackageVersion => cache
                .pkg
                .as_ref()
                .and_then(|pkg| pkg.version.clone())
                .map(Node::string),
        }
    }

    fn replace(&mut self, node: &mut Node, name: &str, mut replacement: Node) {
        debug!("Replacing {} in {}", name, self.file.display());
        replacement.span = node.span;
        *node = replacement;
        self.report.record(name);
    }
}

/// `obj(M_k).obj(M_k-1)...obj(M_1).tail` along the property spine
fn dotted_name(node: &Node, tail: &str) -> String {
    let mut parts = Vec::new();
    let mut cursor = node;
    while let NodeKind::MemberExpression {
        object, property, ..
    } = &cursor.kind
    {
        parts.push(stringify(object));
        cursor = &**property;
    }
    parts.push(tail.to_string());
    parts.join(".")
}
