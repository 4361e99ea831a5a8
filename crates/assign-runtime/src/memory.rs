/*
 * memory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * MemoryRuntime: an in-memory file table.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::traits::{FileReader, RuntimeError, RuntimeResult};

/// Reader that serves files from memory.
///
/// Useful for hosts that keep templates embedded in the binary and for tests
/// that need to change the "filesystem" between reads. Lookups are exact
/// path matches; no normalization is applied.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryRuntime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), contents.into());
    }

    /// Remove a file, returning its previous contents.
    pub fn remove(&self, path: &Path) -> Option<Vec<u8>> {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
    }

    /// Number of files currently stored.
    pub fn len(&self) -> usize {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no files are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FileReader for MemoryRuntime {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| {
                RuntimeError::io(
                    path,
                    io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
                )
            })
    }
}
