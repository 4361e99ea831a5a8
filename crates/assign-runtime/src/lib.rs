/*
 * assign-runtime
 * Copyright (c) 2025 Posit, PBC
 *
 * Filesystem read abstraction for the assign-to-template transform.
 *
 * This crate provides a trait-based abstraction over reading files, allowing
 * the transform to load its template from different sources:
 *
 * - NativeRuntime: the host filesystem (default)
 * - MemoryRuntime: an in-memory file table
 */

mod memory;
mod native;
mod traits;

// Re-export core types (API surface)
pub use traits::{FileReader, RuntimeError, RuntimeResult};

// Re-export runtime implementations
pub use memory::MemoryRuntime;
pub use native::NativeRuntime;

/// Create a default reader for the current platform.
pub fn default_runtime() -> NativeRuntime {
    NativeRuntime::new()
}
