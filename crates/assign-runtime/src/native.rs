/*
 * native.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * NativeRuntime: reads from the real filesystem.
 */

use async_trait::async_trait;
use std::path::Path;

use crate::traits::{FileReader, RuntimeError, RuntimeResult};

/// Reader backed by the host filesystem.
///
/// Relative paths resolve against the process working directory, the same way
/// a build tool invoked from the project root would see them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    /// Create a new native runtime.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileReader for NativeRuntime {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        tracing::trace!(path = %path.display(), "reading file");
        tokio::fs::read(path)
            .await
            .map_err(|e| RuntimeError::io(path, e))
    }
}
