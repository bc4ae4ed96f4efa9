//! Built-in names
//!
//! Built-ins are written in source with the decorated `__name__` spelling and
//! toggled in configuration by their bare name.

use sha2::{Digest, Sha256};

/// The closed set of built-in substitutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltIn {
    Filename,
    Filehash,
    Dirname,
    Now,
    Timestamp,
    PackageName,
    PackageVersion,
}

impl BuiltIn {
    pub const ALL: [BuiltIn; 7] = [
        BuiltIn::Filename,
        BuiltIn::Filehash,
        BuiltIn::Dirname,
        BuiltIn::Now,
        BuiltIn::Timestamp,
        BuiltIn::PackageName,
        BuiltIn::PackageVersion,
    ];

    /// Configuration key: `"filename"`, `"packageversion"`, ...
    pub fn key(&self) -> &'static str {
        match self {
            BuiltIn::Filename => "filename",
            BuiltIn::Filehash => "filehash",
            BuiltIn::Dirname => "dirname",
            BuiltIn::Now => "now",
            BuiltIn::Timestamp => "timestamp",
            BuiltIn::PackageName => "packagename",
            BuiltIn::PackageVersion => "packageversion",
        }
    }

    /// Source spelling: `"__filename__"`, ...
    pub fn identifier(&self) -> &'static str {
        match self {
            BuiltIn::Filename => "__filename__",
            BuiltIn::Filehash => "__filehash__",
            BuiltIn::Dirname => "__dirname__",
            BuiltIn::Now => "__now__",
            BuiltIn::Timestamp => "__timestamp__",
            BuiltIn::PackageName => "__packagename__",
            BuiltIn::PackageVersion => "__packageversion__",
        }
    }

    pub fn from_key(key: &str) -> Option<BuiltIn> {
        Self::ALL.into_iter().find(|b| b.key() == key)
    }

    /// Recognise a source identifier; the bare spelling does not match
    pub fn from_identifier(name: &str) -> Option<BuiltIn> {
        let key = name.strip_prefix("__")?.strip_suffix("__")?;
        Self::from_key(key)
    }

    /// Needs the nearest manifest to produce a value
    pub fn requires_manifest(&self) -> bool {
        !matches!(self, BuiltIn::Now | BuiltIn::Timestamp)
    }
}

/// Short hash identifying a file within its package
///
/// Hashes `<package>!<filename>` (or just the filename when the package has
/// no name) after normalising backslashes, and keeps the first 8 hex digits.
pub fn file_hash(filename: &str, package_name: Option<&str>) -> String {
    let input = match package_name {
        Some(name) => format!("{}!{}", name, filename),
        None => filename.to_string(),
    };
    let digest = Sha256::digest(input.replace('\\', "/").as_bytes());
    hex::encode(&digest[..4])
}
