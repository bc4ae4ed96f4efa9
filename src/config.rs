//! Configuration
//!
//! JSON schema (every field optional):
//!
//! ```json
//! {
//!   "defines":  { "process.env.MODE": "production", "FEATURES": { "beta": true } },
//!   "builtIns": { "timestamp": false },
//!   "manifest": "package.json"
//! }
//! ```
//!
//! Path resolution for [`DefineOptions::from_env`]:
//! 1. `BUILD_DEFINES_CONFIG` environment variable
//! 2. `defines.json` in the working directory
//! 3. Defaults (no defines, every built-in on)

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use defines_core::Value;
use serde::Deserialize;
use tracing::{debug, info};

use crate::builtins::BuiltIn;

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "BUILD_DEFINES_CONFIG";

/// Configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "defines.json";

/// Manifest file searched for in ancestor directories
pub const DEFAULT_MANIFEST: &str = "package.json";

/// Options for a compilation session
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefineOptions {
    /// User overrides: name (possibly dotted) -> value
    pub defines: HashMap<String, Value>,
    /// Built-in toggles
    pub built_ins: BuiltIns,
    /// Manifest file name looked up in ancestor directories
    pub manifest: String,
}

impl Default for DefineOptions {
    fn default() -> Self {
        Self {
            defines: HashMap::new(),
            built_ins: BuiltIns::default(),
            manifest: DEFAULT_MANIFEST.to_string(),
        }
    }
}

impl DefineOptions {
    /// Parse options from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse define options")
    }

    /// Load options from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading define options from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let options: DefineOptions = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        debug!(
            "Loaded {} defines, disabled built-ins: {:?}",
            options.defines.len(),
            options.built_ins.disabled()
        );
        Ok(options)
    }

    /// Load options from `BUILD_DEFINES_CONFIG`, `./defines.json`, or defaults
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(path);
        }

        if Path::new(DEFAULT_CONFIG_FILE).is_file() {
            return Self::from_file(DEFAULT_CONFIG_FILE);
        }

        debug!("No define options file found, using defaults");
        Ok(Self::default())
    }

    /// Add a user define
    pub fn with_define(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defines.insert(name.into(), value.into());
        self
    }

    /// Toggle a built-in
    pub fn with_built_in(mut self, built_in: BuiltIn, enabled: bool) -> Self {
        self.built_ins.set(built_in, enabled);
        self
    }

    /// Use a different manifest file name
    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }
}

/// Per built-in toggles, all enabled by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuiltIns {
    pub filename: bool,
    pub filehash: bool,
    pub dirname: bool,
    pub now: bool,
    pub timestamp: bool,
    pub packagename: bool,
    pub packageversion: bool,
}

impl Default for BuiltIns {
    fn default() -> Self {
        Self {
            filename: true,
            filehash: true,
            dirname: true,
            now: true,
            timestamp: true,
            packagename: true,
            packageversion: true,
        }
    }
}

impl BuiltIns {
    pub fn is_enabled(&self, built_in: BuiltIn) -> bool {
        match built_in {
            BuiltIn::Filename => self.filename,
            BuiltIn::Filehash => self.filehash,
            BuiltIn::Dirname => self.dirname,
            BuiltIn::Now => self.now,
            BuiltIn::Timestamp => self.timestamp,
            BuiltIn::PackageName => self.packagename,
            BuiltIn::PackageVersion => self.packageversion,
        }
    }

    pub fn set(&mut self, built_in: BuiltIn, enabled: bool) {
        let slot = match built_in {
            BuiltIn::Filename => &mut self.filename,
            BuiltIn::Filehash => &mut self.filehash,
            BuiltIn::Dirname => &mut self.dirname,
            BuiltIn::Now => &mut self.now,
            BuiltIn::Timestamp => &mut self.timestamp,
            BuiltIn::PackageName => &mut self.packagename,
            BuiltIn::PackageVersion => &mut self.packageversion,
        };
        *slot = enabled;
    }

    /// Built-ins switched off, for logging
    pub fn disabled(&self) -> Vec<&'static str> {
        BuiltIn::ALL
            .into_iter()
            .filter(|b| !self.is_enabled(*b))
            .map(|b| b.key())
            .collect()
    }
}
