//! End-to-end rewrites against real project trees on disk.
//!
//! Each test lays out a throwaway project (manifest, sources, `node_modules`)
//! in a temp dir and runs files through one `DefineSession`.

use std::fs;
use std::path::Path;

use build_defines::{file_hash, BuiltIn, DefineError, DefineOptions, DefineSession, Node, NodeKind, Value};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const NOW: &str = "2025-03-04 17:05:09";

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "package.json", r#"{"name": "demo", "version": "0.4.0", "private": true}"#);
    temp
}

/// Program with one expression statement per expression
fn program(expressions: Vec<Node>) -> Node {
    Node::program(expressions.into_iter().map(Node::expr_stmt).collect())
}

/// Expressions of a program's top-level expression statements
fn expressions(program: &Node) -> Vec<&Node> {
    let NodeKind::Program { body } = &program.kind else {
        panic!("Expected Program, got {:?}", program.kind);
    };
    body.iter()
        .map(|statement| match &statement.kind {
            NodeKind::ExpressionStatement { expression } => &**expression,
            other => panic!("Expected ExpressionStatement, got {:?}", other),
        })
        .collect()
}

/// Values of a program's expressions, `None` for anything that is not a literal
fn values(program: &Node) -> Vec<Option<Value>> {
    expressions(program).into_iter().map(Value::from_literal).collect()
}

fn string(s: &str) -> Option<Value> {
    Some(Value::from(s))
}

// =============================================================================
// FILE CONSTANTS
// =============================================================================

#[test]
fn test_paths_are_relative_to_manifest_dir() {
    let temp = project();
    let session = DefineSession::with_now(DefineOptions::default(), NOW);

    let mut ast = program(vec![
        Node::ident("__filename__"),
        Node::ident("__dirname__"),
        Node::ident("__packagename__"),
        Node::ident("__packageversion__"),
        Node::ident("__filehash__"),
    ]);
    session
        .transform_file(&temp.path().join("src/views/home.js"), &mut ast)
        .unwrap();

    assert_eq!(
        values(&ast),
        vec![
            string("/src/views/home.js"),
            string("/src/views"),
            string("demo"),
            string("0.4.0"),
            Some(Value::from(file_hash("/src/views/home.js", Some("demo")))),
        ]
    );
}

#[test]
fn test_file_at_project_root() {
    let temp = project();
    let session = DefineSession::with_now(DefineOptions::default(), NOW);

    let mut ast = program(vec![Node::ident("__filename__"), Node::ident("__dirname__")]);
    session.transform_file(&temp.path().join("index.js"), &mut ast).unwrap();

    assert_eq!(values(&ast), vec![string("/index.js"), string("/")]);
}

#[test]
fn test_nearest_manifest_wins() {
    let temp = project();
    write(
        temp.path(),
        "packages/inner/package.json",
        r#"{"name": "inner", "version": "3.1.0"}"#,
    );
    let session = DefineSession::with_now(DefineOptions::default(), NOW);

    let mut ast = program(vec![Node::ident("__filename__"), Node::ident("__packagename__")]);
    session
        .transform_file(&temp.path().join("packages/inner/lib/x.js"), &mut ast)
        .unwrap();

    assert_eq!(values(&ast), vec![string("/lib/x.js"), string("inner")]);
}

#[test]
fn test_file_outside_any_project() {
    let temp = TempDir::new().unwrap();
    let options = DefineOptions::default().with_manifest("no-such-manifest.json");
    let session = DefineSession::with_now(options, NOW);

    let mut ast = program(vec![
        Node::ident("__filename__"),
        Node::ident("__packagename__"),
        Node::ident("__now__"),
    ]);
    let report = session.transform_file(&temp.path().join("a.js"), &mut ast).unwrap();

    assert_eq!(values(&ast), vec![None, None, string(NOW)]);
    assert_eq!(expressions(&ast)[0].as_identifier(), Some("__filename__"));
    assert_eq!(report.replaced, 1);
}

#[test]
fn test_empty_manifest_is_no_project() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "package.json", "{}");
    let session = DefineSession::with_now(DefineOptions::default(), NOW);

    let mut ast = program(vec![Node::ident("__filename__")]);
    let report = session.transform_file(&temp.path().join("a.js"), &mut ast).unwrap();

    assert_eq!(report.replaced, 0);
}

#[test]
fn test_falsy_manifest_is_no_project() {
    for content in ["[]", "false", "\"\"", "0"] {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", content);
        let session = DefineSession::with_now(DefineOptions::default(), NOW);

        let mut ast = program(vec![Node::ident("__filename__"), Node::ident("__now__")]);
        let report = session.transform_file(&temp.path().join("a.js"), &mut ast).unwrap();

        assert_eq!(values(&ast), vec![None, string(NOW)], "manifest {}", content);
        assert_eq!(report.replaced, 1);
    }
}

#[test]
fn test_malformed_manifest_aborts_the_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "package.json", "{ not json");
    let session = DefineSession::with_now(DefineOptions::default(), NOW);

    let mut ast = program(vec![Node::ident("__filename__")]);
    let err = session
        .transform_file(&temp.path().join("a.js"), &mut ast)
        .unwrap_err();

    assert!(matches!(err, DefineError::ManifestParse { .. }), "got {:?}", err);
    assert!(err.to_string().contains("package.json"));
}

// =============================================================================
// SESSION-WIDE VALUES
// =============================================================================

#[test]
fn test_now_is_shared_by_every_file() {
    let temp = project();
    let session = DefineSession::new(DefineOptions::default());

    let mut first = program(vec![Node::ident("__now__")]);
    let mut second = program(vec![Node::ident("__now__")]);
    session.transform_file(&temp.path().join("a.js"), &mut first).unwrap();
    session.transform_file(&temp.path().join("lib/b.js"), &mut second).unwrap();

    assert_eq!(values(&first), values(&second));

    let Some(Some(Value::String(now))) = values(&first).into_iter().next() else {
        panic!("__now__ was not replaced");
    };
    assert_eq!(now, session.cache().now());
    assert_eq!(now.len(), "yyyy-MM-dd HH:mm:ss".len());
    assert_eq!(&now[4..5], "-");
    assert_eq!(&now[10..11], " ");
    assert_eq!(&now[13..14], ":");
}

#[test]
fn test_timestamps_do_not_decrease() {
    let temp = project();
    let session = DefineSession::new(DefineOptions::default());

    let mut stamps = Vec::new();
    for name in ["a.js", "b.js", "c.js"] {
        let mut ast = program(vec![Node::ident("__timestamp__")]);
        session.transform_file(&temp.path().join(name), &mut ast).unwrap();
        match values(&ast).remove(0) {
            Some(Value::Number(ms)) => stamps.push(ms),
            other => panic!("Expected a number, got {:?}", other),
        }
    }

    assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", stamps);
}

#[test]
fn test_session_is_shared_across_threads() {
    let temp = project();
    let session = DefineSession::new(DefineOptions::default());

    std::thread::scope(|scope| {
        for i in 0..4 {
            let session = &session;
            let root = temp.path();
            scope.spawn(move || {
                let mut ast = program(vec![Node::ident("__filename__"), Node::ident("__now__")]);
                session
                    .transform_file(&root.join(format!("src/f{}.js", i)), &mut ast)
                    .unwrap();
                assert_eq!(
                    values(&ast),
                    vec![
                        Some(Value::from(format!("/src/f{}.js", i))),
                        string(session.cache().now()),
                    ]
                );
            });
        }
    });

    assert_eq!(session.cache().cached_manifests(), 1);
}

// =============================================================================
// ELIGIBILITY AND CHAINS
// =============================================================================

#[test]
fn test_declared_names_and_keys_are_kept() {
    let temp = project();
    let session = DefineSession::with_now(DefineOptions::default(), NOW);

    let mut ast = Node::program(vec![
        Node::function_decl(Node::ident("__filename__"), vec![], vec![]),
        Node::expr_stmt(Node::object(vec![
            Node::property(Node::ident("__filename__"), Node::number(1.0)),
            Node::property(Node::ident("a"), Node::ident("__filename__")),
        ])),
    ]);
    session.transform_file(&temp.path().join("src/a.js"), &mut ast).unwrap();

    let expected = Node::program(vec![
        Node::function_decl(Node::ident("__filename__"), vec![], vec![]),
        Node::expr_stmt(Node::object(vec![
            Node::property(Node::ident("__filename__"), Node::number(1.0)),
            Node::property(Node::ident("a"), Node::string("/src/a.js")),
        ])),
    ]);
    assert_eq!(ast, expected);
}

#[test]
fn test_dotted_define_replaces_chain_atomically() {
    let temp = project();
    let options = DefineOptions::from_json(r#"{"defines": {"a.b.c": "deep"}}"#).unwrap();
    let session = DefineSession::with_now(options, NOW);

    let mut ast = program(vec![Node::dotted("a.b.c"), Node::dotted("a.b"), Node::ident("a")]);
    let report = session.transform_file(&temp.path().join("a.js"), &mut ast).unwrap();

    assert_eq!(expressions(&ast)[0], &Node::string("deep"));
    assert_eq!(expressions(&ast)[1], &Node::dotted("a.b"));
    assert_eq!(expressions(&ast)[2], &Node::ident("a"));
    assert_eq!(report.count("a.b.c"), 1);
    assert_eq!(report.replaced, 1);
}

// =============================================================================
// PACKAGE VERSIONS
// =============================================================================

#[test]
fn test_dependency_versions() {
    let temp = project();
    write(
        temp.path(),
        "node_modules/left-pad/package.json",
        r#"{"name": "left-pad", "version": "1.3.0"}"#,
    );
    write(
        temp.path(),
        "node_modules/@acme/widgets/package.json",
        r#"{"name": "@acme/widgets", "version": "2.0.1"}"#,
    );
    let session = DefineSession::with_now(DefineOptions::default(), NOW);

    let version_of = |name: &str| Node::call(Node::ident("__packageversion__"), vec![Node::string(name)]);
    let mut ast = program(vec![
        version_of("left-pad"),
        version_of("@acme/widgets"),
        version_of("not-installed"),
        version_of("demo"),
        version_of("../escape"),
        Node::call(Node::ident("__packageversion__"), vec![]),
    ]);
    session
        .transform_file(&temp.path().join("src/deep/nested/a.js"), &mut ast)
        .unwrap();

    assert_eq!(
        values(&ast),
        vec![
            string("1.3.0"),
            string("2.0.1"),
            string(""),
            string("0.4.0"),
            string(""),
            string("0.4.0"),
        ]
    );
}

#[test]
fn test_dependency_version_resolves_with_built_in_disabled() {
    let temp = project();
    write(
        temp.path(),
        "node_modules/left-pad/package.json",
        r#"{"name": "left-pad", "version": "1.3.0"}"#,
    );
    let options = DefineOptions::default().with_built_in(BuiltIn::PackageVersion, false);
    let session = DefineSession::with_now(options, NOW);

    let mut ast = program(vec![
        Node::call(Node::ident("__packageversion__"), vec![Node::string("left-pad")]),
        Node::call(Node::ident("__packageversion__"), vec![]),
        Node::ident("__packageversion__"),
    ]);
    let report = session.transform_file(&temp.path().join("src/a.js"), &mut ast).unwrap();

    assert_eq!(values(&ast)[0], string("1.3.0"));
    assert_eq!(values(&ast)[1], None);
    assert_eq!(values(&ast)[2], None);
    assert_eq!(report.replaced, 1);
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn test_defines_and_toggles_from_config() {
    let temp = project();
    write(
        temp.path(),
        "defines.json",
        r#"{
            "defines": {
                "__filename__": "overridden",
                "process.env.MODE": "production",
                "FEATURES": { "beta": true, "tiers": [1, 2] }
            },
            "builtIns": { "dirname": false, "packagename": false }
        }"#,
    );
    let options = DefineOptions::from_file(temp.path().join("defines.json")).unwrap();
    assert!(!options.built_ins.is_enabled(BuiltIn::Dirname));
    let session = DefineSession::with_now(options, NOW);

    let mut ast = program(vec![
        Node::ident("__filename__"),
        Node::dotted("process.env.MODE"),
        Node::ident("FEATURES"),
        Node::ident("__dirname__"),
        Node::ident("__packagename__"),
        Node::ident("__packageversion__"),
    ]);
    session.transform_file(&temp.path().join("src/a.js"), &mut ast).unwrap();

    assert_eq!(
        values(&ast),
        vec![
            string("overridden"),
            string("production"),
            Some(Value::object([
                ("beta", Value::Bool(true)),
                ("tiers", Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])),
            ])),
            None,
            None,
            string("0.4.0"),
        ]
    );
}

#[test]
fn test_json_ast_round_trip() {
    let temp = project();
    let session = DefineSession::with_now(DefineOptions::default(), NOW);

    let mut ast: Node = serde_json::from_str(
        r#"{
            "type": "Program",
            "body": [
                {
                    "type": "ExpressionStatement",
                    "expression": {
                        "type": "CallExpression",
                        "callee": { "type": "Identifier", "name": "log" },
                        "arguments": [
                            { "type": "Identifier", "name": "__filename__", "span": { "start": 4, "end": 16 } }
                        ]
                    }
                }
            ]
        }"#,
    )
    .unwrap();
    session.transform_file(&temp.path().join("main.js"), &mut ast).unwrap();

    let json = serde_json::to_value(&ast).unwrap();
    let argument = &json["body"][0]["expression"]["arguments"][0];
    assert_eq!(argument["type"], "StringLiteral");
    assert_eq!(argument["value"], "/main.js");
    assert_eq!(argument["span"]["start"], 4);
    assert_eq!(argument["span"]["end"], 16);
}
