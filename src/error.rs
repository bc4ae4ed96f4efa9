//! Error types for manifest resolution
//!
//! Only filesystem and manifest failures are errors. Everything else the pass
//! runs into (unknown package names, values with no literal form) degrades to
//! a safe default instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefineError {
    #[error("failed to read manifest {}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse manifest {}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot resolve {} against the working directory", path.display())]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = DefineError> = std::result::Result<T, E>;
