//! Constant cache resolver
//!
//! Finds the nearest ancestor manifest (`package.json` by default) for each
//! file and derives the per-file constants from it.
//!
//! - Manifests are memoized by path for the lifetime of the resolver; there
//!   are no mtime checks.
//! - `now` is captured once when the resolver is created.
//! - `filename` / `dirname` are recomputed on every call.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{DefineError, Result};

/// `yyyy-MM-dd HH:mm:ss`
pub const NOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Project descriptor read from the manifest file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Every other field, kept verbatim
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Constants visible to a single file
#[derive(Debug, Clone, PartialEq)]
pub struct FileConstCache {
    /// Nearest manifest, if any
    pub pkg: Option<Arc<Manifest>>,
    /// Directory holding the manifest
    pub cwd: Option<PathBuf>,
    /// Session start time, formatted with [`NOW_FORMAT`]
    pub now: String,
    /// `/`-prefixed POSIX path of the file relative to `cwd`
    pub filename: Option<String>,
    /// `/`-prefixed POSIX path of the file's directory relative to `cwd`
    pub dirname: Option<String>,
}

impl FileConstCache {
    /// Cache for a file outside any project
    pub fn empty(now: impl Into<String>) -> Self {
        Self {
            pkg: None,
            cwd: None,
            now: now.into(),
            filename: None,
            dirname: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pkg.is_none()
    }
}

/// Resolves [`FileConstCache`]s and memoizes manifests by path
#[derive(Debug)]
pub struct ConstCacheResolver {
    manifest_file: String,
    now: String,
    manifests: RwLock<HashMap<PathBuf, Arc<Manifest>>>,
}

impl ConstCacheResolver {
    /// Create a resolver looking for `manifest_file`, stamping `now` with the current local time
    pub fn new(manifest_file: impl Into<String>) -> Self {
        Self::with_now(manifest_file, Local::now().format(NOW_FORMAT).to_string())
    }

    /// Create a resolver with a fixed `now`
    pub fn with_now(manifest_file: impl Into<String>, now: impl Into<String>) -> Self {
        Self {
            manifest_file: manifest_file.into(),
            now: now.into(),
            manifests: RwLock::new(HashMap::new()),
        }
    }

    pub fn now(&self) -> &str {
        &self.now
    }

    /// Number of memoized manifests
    pub fn cached_manifests(&self) -> usize {
        self.manifests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Resolve the constants for `file`
    pub fn resolve(&self, file: &Path) -> Result<FileConstCache> {
        let file = absolutize(file)?;

        let Some(manifest_path) = self.find_manifest(&file) else {
            debug!("No {} above {}", self.manifest_file, file.display());
            return Ok(FileConstCache::empty(&self.now));
        };
        if manifest_path == file {
            return Ok(FileConstCache::empty(&self.now));
        }
        let Some(pkg) = self.load_manifest(&manifest_path)? else {
            return Ok(FileConstCache::empty(&self.now));
        };

        let cwd = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let dir = file.parent().unwrap_or(&cwd);

        Ok(FileConstCache {
            filename: Some(posix_relative(&cwd, &file)),
            dirname: Some(posix_relative(&cwd, dir)),
            pkg: Some(pkg),
            cwd: Some(cwd),
            now: self.now.clone(),
        })
    }

    /// Find the manifest of dependency `name` as seen from `from_file`
    ///
    /// Looks in `node_modules/<name>/` of every ancestor directory, then
    /// checks whether the enclosing project itself is called `name`.
    pub fn resolve_package(&self, name: &str, from_file: &Path) -> Result<Option<Arc<Manifest>>> {
        if !is_package_name(name) {
            debug!("Refusing to resolve package name {:?}", name);
            return Ok(None);
        }
        let file = absolutize(from_file)?;
        let start = file.parent().unwrap_or(&file);

        for dir in start.ancestors() {
            let candidate = dir
                .join("node_modules")
                .join(name)
                .join(&self.manifest_file);
            if candidate.is_file() {
                return self.load_manifest(&candidate);
            }
        }

        if let Some(manifest_path) = self.find_manifest(&file) {
            if let Some(pkg) = self.load_manifest(&manifest_path)? {
                if pkg.name.as_deref() == Some(name) {
                    return Ok(Some(pkg));
                }
            }
        }

        Ok(None)
    }

    /// Nearest manifest in the file's directory or its ancestors
    fn find_manifest(&self, file: &Path) -> Option<PathBuf> {
        let start = file.parent()?;
        start
            .ancestors()
            .map(|dir| dir.join(&self.manifest_file))
            .find(|candidate| candidate.is_file())
    }

    /// Load a manifest, memoized; `None` for an empty manifest (not memoized)
    fn load_manifest(&self, path: &Path) -> Result<Option<Arc<Manifest>>> {
        if let Some(pkg) = self
            .manifests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            trace!("Manifest cache hit {}", path.display());
            return Ok(Some(Arc::clone(pkg)));
        }

        debug!("Loading manifest {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| DefineError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_error = |source| DefineError::ManifestParse {
            path: path.to_path_buf(),
            source,
        };
        let json: serde_json::Value = serde_json::from_str(&content).map_err(parse_error)?;

        // Anything without own keys is an empty manifest
        let manifest = match json {
            serde_json::Value::Object(map) if !map.is_empty() => {
                serde_json::from_value::<Manifest>(serde_json::Value::Object(map))
                    .map_err(parse_error)?
            }
            serde_json::Value::String(s) if !s.is_empty() => Manifest::default(),
            serde_json::Value::Array(items) if !items.is_empty() => Manifest::default(),
            _ => {
                debug!("Manifest {} is empty, ignoring", path.display());
                return Ok(None);
            }
        };

        let pkg = Arc::new(manifest);
        let mut manifests = self
            .manifests
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = manifests.entry(path.to_path_buf()).or_insert(pkg);
        Ok(Some(Arc::clone(entry)))
    }
}

/// Make `path` absolute and lexically normalised
fn absolutize(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| DefineError::WorkingDirectory {
                path: path.to_path_buf(),
                source,
            })?
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// `/a/b` relative to `base`, POSIX separators, single leading slash
fn posix_relative(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    format!("/{}", segments.join("/"))
}

/// Plain or `@scope/` package name that cannot escape `node_modules`
fn is_package_name(name: &str) -> bool {
    let mut parts = name.split('/');
    let first = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();

    let valid = |part: &str| !part.is_empty() && part != "." && part != ".." && !part.contains('\\');
    match rest.as_slice() {
        [] => valid(first) && !first.starts_with('@'),
        [package] => first.starts_with('@') && valid(first) && valid(package),
        _ => false,
    }
}
