//! build-defines: compile-time identifier substitution
//!
//! Rewrites "magic" identifiers in a parsed file with literals known only at
//! build time:
//! - `__filename__` / `__dirname__`: path relative to the nearest `package.json`
//! - `__filehash__`: short, stable hash of that path
//! - `__now__` / `__timestamp__`: build time
//! - `__packagename__` / `__packageversion__`: manifest metadata
//! - any user define, including dotted names such as `process.env.MODE`
//!
//! The pure AST pieces (stringifier, literalizer) live in `defines-core`;
//! this crate adds manifest discovery and the rewrite pass.
//!
//! ```no_run
//! use build_defines::{DefineOptions, DefineSession, Node};
//!
//! let session = DefineSession::new(DefineOptions::default());
//! let mut program = Node::program(vec![Node::expr_stmt(Node::ident("__filename__"))]);
//! let report = session
//!     .transform_file("/work/app/src/main.js".as_ref(), &mut program)
//!     .unwrap();
//! println!("{} replacements", report.replaced);
//! ```

pub mod builtins;
pub mod cache;
pub mod config;
pub mod error;
pub mod resolver;
pub mod session;

// Re-export commonly used types
pub use builtins::{file_hash, BuiltIn};
pub use cache::{ConstCacheResolver, FileConstCache, Manifest};
pub use config::{BuiltIns, DefineOptions};
pub use defines_core::{literalize, stringify, Node, NodeKind, Span, Value};
pub use error::{DefineError, Result};
pub use resolver::{IdentifierResolver, TransformReport};
pub use session::DefineSession;
