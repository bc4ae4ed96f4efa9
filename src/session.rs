//! Compilation session
//!
//! A session owns the options and the constant cache for one build. Create
//! it once and feed every file through [`DefineSession::transform_file`], so
//! that all files agree on `__now__` and manifests are read once.

use std::path::Path;

use defines_core::Node;
use tracing::{debug, info};

use crate::cache::{ConstCacheResolver, FileConstCache};
use crate::config::DefineOptions;
use crate::error::Result;
use crate::resolver::{IdentifierResolver, TransformReport};

/// Options plus the session-wide constant cache
#[derive(Debug)]
pub struct DefineSession {
    options: DefineOptions,
    cache: ConstCacheResolver,
}

impl DefineSession {
    pub fn new(options: DefineOptions) -> Self {
        let cache = ConstCacheResolver::new(options.manifest.clone());
        debug!(
            "Session started at {} with {} defines",
            cache.now(),
            options.defines.len()
        );
        Self { options, cache }
    }

    /// Session with a fixed `now`, for reproducible builds
    pub fn with_now(options: DefineOptions, now: impl Into<String>) -> Self {
        let cache = ConstCacheResolver::with_now(options.manifest.clone(), now);
        Self { options, cache }
    }

    pub fn options(&self) -> &DefineOptions {
        &self.options
    }

    pub fn cache(&self) -> &ConstCacheResolver {
        &self.cache
    }

    /// Constants that apply to `path`
    pub fn file_constants(&self, path: &Path) -> Result<FileConstCache> {
        self.cache.resolve(path)
    }

    /// Rewrite `program` (the AST of the file at `path`) in place
    pub fn transform_file(&self, path: &Path, program: &mut Node) -> Result<TransformReport> {
        let constants = self.cache.resolve(path)?;
        let report = IdentifierResolver::new(&self.options, &constants, &self.cache, path).run(program)?;

        if report.replaced > 0 {
            info!("{}: replaced {} identifiers", path.display(), report.replaced);
        } else {
            debug!("{}: nothing to replace", path.display());
        }
        Ok(report)
    }
}
