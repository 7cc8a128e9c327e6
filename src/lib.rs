//! # rootfence
//!
//! Root-confined file operations with backup-before-mutation, built for
//! callers that pass along untrusted paths — an HTTP handler, or an agent
//! runtime surfacing these operations as an LLM tool.
//!
//! A [`Sandbox`] is constructed once with a root directory. Every call
//! resolves its relative path against that root and rejects anything that
//! escapes it — `..` traversal, absolute paths, sibling directories that
//! merely share a string prefix with the root, and symlinks pointing
//! outside. Mutations copy the existing file to a `.bak` sibling before
//! destroying its content, so the previous version is always recoverable
//! after a failed write.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rootfence::Sandbox;
//!
//! # fn main() -> Result<(), rootfence::Error> {
//! let sandbox = Sandbox::new("workspace")?;
//! sandbox.write_file("notes/today.md", "check the logs")?;
//! for entry in sandbox.list_dir(Some("notes"))? {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Tool runtimes that receive operations as JSON can go through the tagged
//! [`Request`]/[`Response`] pair and [`Sandbox::handle`] instead of calling
//! the methods directly.
//!
//! All failures come back as [`Error`] values: [`Error::Rejected`] for
//! out-of-scope paths (checked before any I/O), [`Error::NotFound`] for
//! in-scope paths with nothing there, and [`Error::Io`] for everything the
//! filesystem refuses. The crate never deletes backups and keeps no state
//! between calls.

mod error;
mod request;
mod sandbox;

pub use error::Error;
pub use request::{Request, Response};
pub use sandbox::{DirEntry, Sandbox, WriteOutcome};
