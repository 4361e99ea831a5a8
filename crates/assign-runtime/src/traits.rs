/*
 * traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the FileReader trait and the error type shared by all readers.
 *
 * Readers decide where template bytes come from:
 * - NativeRuntime: the real filesystem via tokio
 * - MemoryRuntime: an in-memory file table (tests, embedded hosts)
 */

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// A failed filesystem operation.
///
/// The underlying [`io::Error`] is held behind an `Arc` so the error can be
/// cloned and handed to every caller waiting on the same read.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    path: PathBuf,
    source: Arc<io::Error>,
}

impl RuntimeError {
    /// Wrap an I/O error raised while operating on `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// The path the operation was performed on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The kind of the underlying I/O error.
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }

    /// Errno-style code for the failure (`ENOENT`, `EACCES`, ...).
    ///
    /// Returns `None` for error kinds that have no conventional errno name.
    pub fn code(&self) -> Option<&'static str> {
        match self.kind() {
            io::ErrorKind::NotFound => Some("ENOENT"),
            io::ErrorKind::PermissionDenied => Some("EACCES"),
            io::ErrorKind::AlreadyExists => Some("EEXIST"),
            io::ErrorKind::IsADirectory => Some("EISDIR"),
            io::ErrorKind::NotADirectory => Some("ENOTDIR"),
            io::ErrorKind::InvalidInput => Some("EINVAL"),
            io::ErrorKind::Interrupted => Some("EINTR"),
            _ => None,
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code() {
            Some(code) => write!(
                f,
                "{}: {}, open '{}'",
                code,
                self.source,
                self.path.display()
            ),
            None => write!(f, "{}, open '{}'", self.source, self.path.display()),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Source of raw file bytes.
///
/// The transform only ever reads one file (its template), so this is the whole
/// filesystem surface it needs. Implementations must be shareable across
/// tasks because the first read may run on a spawned task.
#[async_trait]
pub trait FileReader: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Read entire file contents as bytes.
    async fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_enoent() {
        let err = RuntimeError::io(
            "missing.tera",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(err.code(), Some("ENOENT"));
        assert_eq!(err.path(), Path::new("missing.tera"));

        let msg = err.to_string();
        assert!(msg.starts_with("ENOENT: "));
        assert!(msg.contains("missing.tera"));
    }

    #[test]
    fn test_unmapped_kind_has_no_code() {
        let err = RuntimeError::io("x", io::Error::other("boom"));
        assert_eq!(err.code(), None);
        assert!(!err.to_string().contains("ENOENT"));
    }

    #[test]
    fn test_clone_shares_source() {
        let err = RuntimeError::io(
            "locked",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let copy = err.clone();
        assert_eq!(copy.code(), Some("EACCES"));
        assert_eq!(copy.kind(), io::ErrorKind::PermissionDenied);
        assert!(std::error::Error::source(&copy).is_some());
    }
}
