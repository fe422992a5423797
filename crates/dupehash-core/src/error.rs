use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dupehash operations.
///
/// Per spec: transient I/O, permission-denied and persistent-store faults are all
/// recoverable at the call site that produced them (the scheduler logs and omits
/// the offending entry rather than propagating). This type exists for the few
/// places that *do* need to surface a failure to a caller — a single-file hash
/// requested directly, or a persistent-store fault bubbled up for visibility.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("persistent store fault: {0}")]
    PersistentStoreFault(String),

    #[error("hash operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied { path: path.into() };
        }
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
