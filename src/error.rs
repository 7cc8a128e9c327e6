//! Error types for sandboxed file operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a [`Sandbox`](crate::Sandbox) operation.
///
/// Every failure is returned as a value; nothing panics past the crate
/// boundary. The three kinds are deliberately distinct so callers can map
/// them to their own surface (HTTP status, tool-error text) without
/// inspecting filesystem error codes:
///
/// - [`Error::Rejected`] is raised before any I/O happens.
/// - [`Error::NotFound`] means the path stayed inside the root but nothing
///   exists there.
/// - [`Error::Io`] means the target was in scope and the underlying
///   filesystem call failed.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested path resolves outside the sandbox root.
    #[error("path '{path}' is out of scope for this sandbox")]
    Rejected {
        /// The path as the caller supplied it.
        path: PathBuf,
    },

    /// The resolved path stays inside the root, but no entry exists there
    /// (or, for listings, the entry is not a directory).
    #[error("no such file or directory at '{path}'")]
    NotFound {
        /// The in-scope path that was missing.
        path: PathBuf,
    },

    /// An in-scope filesystem operation failed.
    #[error("{op} failed for '{path}': {source}")]
    Io {
        /// Short verb describing the failed step, e.g. `"read"` or
        /// `"backup"`.
        op: &'static str,
        /// The resolved path the operation targeted.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Returns whether this is a traversal rejection.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns whether this is a missing-entry outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
