//! Define substitution CLI
//!
//! Drives the rewrite pass over JSON-serialized ASTs, for build scripts and
//! for checking what a file would see.
//!
//! # Usage
//!
//! ```bash
//! # Rewrite an AST as if it were src/main.js
//! cat main.ast.json | defines_cli transform --file src/main.js
//!
//! # Show the constants for a file
//! defines_cli inspect --file src/main.js
//!
//! # Render an expression
//! defines_cli stringify --ast '{"type":"Identifier","name":"a"}'
//! ```

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use build_defines::{stringify, BuiltIn, DefineOptions, DefineSession, Node};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

#[derive(Parser)]
#[command(name = "defines_cli")]
#[command(version)]
#[command(about = "Bake build-time constants and user defines into JSON ASTs")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress the summary on stderr
    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite an AST and print the result as JSON
    Transform {
        /// Source file the AST belongs to
        #[arg(short, long)]
        file: PathBuf,

        /// AST as JSON (reads stdin if not provided)
        #[arg(long)]
        ast: Option<String>,

        /// Options file (falls back to ./defines.json)
        #[arg(short, long, env = "BUILD_DEFINES_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the constants a file would see
    Inspect {
        /// Source file
        #[arg(short, long)]
        file: PathBuf,

        /// Options file (falls back to ./defines.json)
        #[arg(short, long, env = "BUILD_DEFINES_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the canonical text of an expression
    Stringify {
        /// Expression AST as JSON (reads stdin if not provided)
        #[arg(long)]
        ast: Option<String>,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transform { file, ast, config } => cmd_transform(file, ast, config, cli.quiet),
        Commands::Inspect { file, config } => cmd_inspect(file, config),
        Commands::Stringify { ast } => cmd_stringify(ast),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_transform(file: PathBuf, ast: Option<String>, config: Option<PathBuf>, quiet: bool) -> Result<()> {
    let options = load_options(config)?;
    let mut program = parse_ast(ast)?;

    let session = DefineSession::new(options);
    let report = session
        .transform_file(&file, &mut program)
        .with_context(|| format!("Failed to transform {}", file.display()))?;

    println!("{}", serde_json::to_string_pretty(&program)?);

    if !quiet {
        eprintln!(
            "{} {} replaced {} identifier(s)",
            "OK".green().bold(),
            file.display(),
            report.replaced
        );
        for (name, count) in &report.by_name {
            eprintln!("  {} x{}", name, count);
        }
    }
    Ok(())
}

fn cmd_inspect(file: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let options = load_options(config)?;
    let session = DefineSession::new(options);
    let constants = session
        .file_constants(&file)
        .with_context(|| format!("Failed to resolve constants for {}", file.display()))?;

    let enabled: Vec<&str> = BuiltIn::ALL
        .into_iter()
        .filter(|b| session.options().built_ins.is_enabled(*b))
        .map(|b| b.identifier())
        .collect();

    let output = serde_json::json!({
        "file": file.display().to_string(),
        "manifestDir": constants.cwd.as_ref().map(|cwd| cwd.display().to_string()),
        "packageName": constants.pkg.as_ref().and_then(|pkg| pkg.name.clone()),
        "packageVersion": constants.pkg.as_ref().and_then(|pkg| pkg.version.clone()),
        "filename": constants.filename,
        "dirname": constants.dirname,
        "now": constants.now,
        "enabled": enabled,
        "defines": session.options().defines.len(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cmd_stringify(ast: Option<String>) -> Result<()> {
    let node = parse_ast(ast)?;
    println!("{}", stringify(&node));
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

fn load_options(config: Option<PathBuf>) -> Result<DefineOptions> {
    match config {
        Some(path) => DefineOptions::from_file(path),
        None => DefineOptions::from_env(),
    }
}

fn parse_ast(ast: Option<String>) -> Result<Node> {
    let source = match ast {
        Some(json) => json,
        None => read_stdin()?,
    };
    debug!("Parsing {} bytes of AST JSON", source.len());
    serde_json::from_str(&source).context("Failed to parse AST JSON")
}

fn read_stdin() -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        bail!("No input provided. Use --ast or pipe JSON via stdin.");
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}
