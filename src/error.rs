//! Error types
//!
//! Failures surfaced by hashing, ledger maintenance, and release lookups.

use std::path::PathBuf;

/// Result alias used across the library
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Error reading file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error writing file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[source] toml::ser::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Hash does not match expected value {expected}")]
    HashMismatch { expected: String },
}

/// Problems locating or rebuilding the version list of a ledger document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Could not locate version list section in the ledger")]
    SectionNotFound,

    #[error("Could not find 'Latest Stable Release' section to append to")]
    AppendAnchorNotFound,

    #[error("Ledger contains no release entries")]
    NoEntries,

    #[error("Google release list is unavailable for sync")]
    ReleaseListUnavailable,
}

impl Error {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::Read { path, source }
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
