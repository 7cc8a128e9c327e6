//! The sandbox itself: root handling, path confinement, and the four file
//! operations.

use std::{
    ffi::OsString,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;

/// A single entry produced by [`Sandbox::list_dir`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DirEntry {
    /// File or directory name, without any path prefix.
    pub name: String,
    /// `true` for regular files.
    pub is_file: bool,
    /// Size in bytes for files; directories report 0.
    pub size: u64,
}

/// How a mutation completed. Both variants are success outcomes; the
/// distinction exists so callers can report whether a backup was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The target did not exist beforehand, so there was nothing to back up.
    Fresh,
    /// The pre-existing content was copied to the `.bak` sibling before the
    /// destructive step.
    BackedUp,
}

impl WriteOutcome {
    /// Returns whether a backup copy was written.
    #[must_use]
    pub const fn backup_created(self) -> bool {
        matches!(self, Self::BackedUp)
    }
}

/// File operations confined to a fixed root directory.
///
/// Every call resolves its relative path against the root and re-validates
/// the confinement invariant before touching the filesystem; nothing is
/// cached between calls. Mutations copy the existing content to a `.bak`
/// sibling before destroying it. The type holds no open resources, so
/// cloning is cheap; callers invoking it concurrently must serialize
/// mutations of the same path themselves.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Creates a sandbox rooted at `root`, creating the directory if it
    /// does not exist yet.
    ///
    /// The root is canonicalized once here and never changes for the
    /// lifetime of the value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the root cannot be created or
    /// canonicalized.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| Error::io("create root", root.clone(), err))?;
        let root = root
            .canonicalize()
            .map_err(|err| Error::io("canonicalize root", root.clone(), err))?;
        debug!(root = %root.display(), "sandbox initialized");
        Ok(Self { root })
    }

    /// The canonical root all relative paths are confined to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists the immediate children of a directory under the root.
    ///
    /// `None` (or an empty string) lists the root itself. Enumeration is
    /// non-recursive, and entry order is whatever the filesystem yields;
    /// callers should not rely on it.
    ///
    /// # Errors
    ///
    /// [`Error::Rejected`] when the path escapes the root,
    /// [`Error::NotFound`] when it resolves in scope but is missing or not
    /// a directory, [`Error::Io`] for other enumeration failures.
    pub fn list_dir(&self, relative: Option<&str>) -> Result<Vec<DirEntry>, Error> {
        let target = self.resolve(relative)?;
        let metadata = match fs::metadata(&target) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound { path: target });
            }
            Err(err) => return Err(Error::io("list", target, err)),
        };
        if !metadata.is_dir() {
            return Err(Error::NotFound { path: target });
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&target).map_err(|err| Error::io("list", target.clone(), err))? {
            let entry = entry.map_err(|err| Error::io("list", target.clone(), err))?;
            let metadata = entry
                .metadata()
                .map_err(|err| Error::io("list", entry.path(), err))?;
            let is_file = metadata.is_file();
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_file,
                size: if is_file { metadata.len() } else { 0 },
            });
        }
        debug!(path = %target.display(), count = entries.len(), "listed directory");
        Ok(entries)
    }

    /// Reads the full UTF-8 content of a file under the root.
    ///
    /// # Errors
    ///
    /// [`Error::Rejected`] when the path escapes the root,
    /// [`Error::NotFound`] when no file exists at the resolved location,
    /// [`Error::Io`] for other failures (permissions, is-a-directory,
    /// invalid UTF-8).
    pub fn read_file(&self, relative: &str) -> Result<String, Error> {
        let target = self.resolve(Some(relative))?;
        match fs::read_to_string(&target) {
            Ok(content) => {
                debug!(path = %target.display(), bytes = content.len(), "read file");
                Ok(content)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(Error::NotFound { path: target })
            }
            Err(err) => Err(Error::io("read", target, err)),
        }
    }

    /// Creates or overwrites a file under the root with exactly `content`.
    ///
    /// Missing parent directories are created. When the target already
    /// exists, its current bytes are copied to the `.bak` sibling before
    /// the target is truncated; the copy must complete before any
    /// destructive step, so a failed write still leaves the previous
    /// content recoverable. No newline is appended. The operation as a
    /// whole is not atomic; only the backup-before-destroy ordering is
    /// guaranteed.
    ///
    /// # Errors
    ///
    /// [`Error::Rejected`] when the path escapes the root, [`Error::Io`]
    /// when directory creation, the backup copy, or the write fails.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<WriteOutcome, Error> {
        let target = self.resolve(Some(relative))?;
        ensure_parent(&target)?;
        let outcome = backup(&target)?;
        fs::write(&target, content).map_err(|err| Error::io("write", target.clone(), err))?;
        debug!(
            path = %target.display(),
            bytes = content.len(),
            backup = outcome.backup_created(),
            "wrote file"
        );
        Ok(outcome)
    }

    /// Appends `content` verbatim to a file under the root, creating it if
    /// absent.
    ///
    /// Same parent-directory creation and backup ordering as
    /// [`Sandbox::write_file`]. When the file did not exist there is
    /// nothing to protect, so no backup is taken and the outcome is
    /// [`WriteOutcome::Fresh`].
    ///
    /// # Errors
    ///
    /// [`Error::Rejected`] when the path escapes the root, [`Error::Io`]
    /// when directory creation, the backup copy, or the append fails.
    pub fn append_file(&self, relative: &str, content: &str) -> Result<WriteOutcome, Error> {
        let target = self.resolve(Some(relative))?;
        ensure_parent(&target)?;
        let outcome = backup(&target)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&target)
            .map_err(|err| Error::io("append", target.clone(), err))?;
        file.write_all(content.as_bytes())
            .map_err(|err| Error::io("append", target.clone(), err))?;
        debug!(
            path = %target.display(),
            bytes = content.len(),
            backup = outcome.backup_created(),
            "appended to file"
        );
        Ok(outcome)
    }

    /// Resolves `relative` against the root, rejecting anything that
    /// escapes it.
    ///
    /// The joined path is lexically normalized first so both confinement
    /// checks run before any filesystem access: the result must start with
    /// the canonical root component-wise (a string prefix alone would let
    /// `/work` pass for `/workspace`), and the remainder after stripping
    /// the root must contain no `..` segment. Symlinks are then followed
    /// over the part of the path that exists and both checks run again on
    /// the real location, so a link inside the root pointing outside is
    /// rejected too. A dangling symlink is rejected rather than written
    /// through, since its eventual target cannot be verified.
    fn resolve(&self, relative: Option<&str>) -> Result<PathBuf, Error> {
        let supplied = PathBuf::from(relative.unwrap_or_default());
        let candidate = match relative {
            Some(path) if !path.is_empty() => self.root.join(path),
            _ => self.root.clone(),
        };

        let normalized = self.confine(normalize(&candidate), &supplied)?;
        let real = follow_existing(&normalized).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                Error::Rejected {
                    path: supplied.clone(),
                }
            } else {
                Error::io("resolve", normalized.clone(), err)
            }
        })?;
        let resolved = self.confine(real, &supplied)?;
        debug!(root = %self.root.display(), resolved = %resolved.display(), "resolved path");
        Ok(resolved)
    }

    /// Applies both confinement checks to an already-normalized path.
    fn confine(&self, path: PathBuf, supplied: &Path) -> Result<PathBuf, Error> {
        let rejected = || Error::Rejected {
            path: supplied.to_path_buf(),
        };
        if !path.starts_with(&self.root) {
            return Err(rejected());
        }
        let remainder = path.strip_prefix(&self.root).map_err(|_| rejected())?;
        if remainder
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(rejected());
        }
        Ok(path)
    }
}

/// Folds `.` and `..` segments without touching the filesystem. A `..`
/// that climbs past the start of the path is kept, which makes the
/// confinement checks fail as intended.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            _ => out.push(component),
        }
    }
    out
}

/// Canonicalizes the deepest existing ancestor of `path` and re-attaches
/// the missing suffix, so symlinks are followed over whatever part of the
/// path exists. A dangling symlink surfaces as `NotFound` from the final
/// canonicalization even though the entry itself exists.
fn follow_existing(path: &Path) -> io::Result<PathBuf> {
    let mut base = path.to_path_buf();
    let mut missing: Vec<OsString> = Vec::new();
    loop {
        match base.symlink_metadata() {
            Ok(_) => break,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let Some(name) = base.file_name() else {
                    return Ok(path.to_path_buf());
                };
                missing.push(name.to_os_string());
                base.pop();
            }
            Err(err) => return Err(err),
        }
    }
    let mut real = base.canonicalize()?;
    for name in missing.iter().rev() {
        real.push(name);
    }
    Ok(real)
}

fn ensure_parent(target: &Path) -> Result<(), Error> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| Error::io("create parent directories", parent.to_path_buf(), err))?;
    }
    Ok(())
}

/// Copies `target` to its `.bak` sibling when it already exists. Runs
/// before every destructive step; an error here aborts the mutation with
/// the original content untouched. Only the most recent backup is kept.
fn backup(target: &Path) -> Result<WriteOutcome, Error> {
    if !target.exists() {
        return Ok(WriteOutcome::Fresh);
    }
    let bak = backup_path(target);
    fs::copy(target, &bak).map_err(|err| Error::io("backup", target.to_path_buf(), err))?;
    debug!(path = %target.display(), backup = %bak.display(), "backup taken");
    Ok(WriteOutcome::BackedUp)
}

/// The `.bak` sibling for `target`. The suffix is appended to the full
/// file name, so `notes.txt` backs up to `notes.txt.bak`.
fn backup_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}
