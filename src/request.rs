//! Tagged request/response types for tool-runtime callers.
//!
//! An agent runtime exposing this crate as a single tool can deserialize
//! the model's arguments into a [`Request`], dispatch it through
//! [`Sandbox::handle`], and serialize the resulting [`Response`]. The
//! schema derives give the runtime a machine-readable description of the
//! argument shape; an operation the component does not know is rejected at
//! deserialization rather than dispatched on a string at access time.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    sandbox::{DirEntry, Sandbox, WriteOutcome},
};

/// A single file operation requested by an external caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Request {
    /// List the immediate children of a directory.
    List {
        /// Directory to list, relative to the root; omitted means the root
        /// itself.
        path: Option<String>,
    },
    /// Read the full text content of a file.
    Read {
        /// File to read, relative to the root.
        path: String,
    },
    /// Create or overwrite a file, backing up any existing content first.
    Write {
        /// File to write, relative to the root.
        path: String,
        /// Exact content to store; nothing is appended to it.
        contents: String,
    },
    /// Append to the end of a file, backing up any existing content first.
    Append {
        /// File to append to, relative to the root.
        path: String,
        /// Content appended verbatim.
        contents: String,
    },
}

/// Result of a successfully handled [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    /// Children of the listed directory, membership-ordered by the
    /// filesystem.
    Listing {
        /// One entry per immediate child.
        entries: Vec<DirEntry>,
    },
    /// Text content of the requested file.
    Contents {
        /// The file's full UTF-8 content.
        text: String,
    },
    /// A write completed.
    Wrote {
        /// Whether a backup of the previous content was taken.
        outcome: WriteOutcome,
    },
    /// An append completed.
    Appended {
        /// Whether a backup of the previous content was taken.
        outcome: WriteOutcome,
    },
}

impl Sandbox {
    /// Dispatches a [`Request`] to the matching operation.
    ///
    /// # Errors
    ///
    /// Propagates the [`Error`] of the underlying operation unchanged.
    pub fn handle(&self, request: Request) -> Result<Response, Error> {
        match request {
            Request::List { path } => Ok(Response::Listing {
                entries: self.list_dir(path.as_deref())?,
            }),
            Request::Read { path } => Ok(Response::Contents {
                text: self.read_file(&path)?,
            }),
            Request::Write { path, contents } => Ok(Response::Wrote {
                outcome: self.write_file(&path, &contents)?,
            }),
            Request::Append { path, contents } => Ok(Response::Appended {
                outcome: self.append_file(&path, &contents)?,
            }),
        }
    }
}
