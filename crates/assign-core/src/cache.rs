/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Lazily loaded, shared template source.
 */

//! Template cache.
//!
//! The template is read once and shared by every record for the lifetime of
//! the stage. The first read starts when the cache is created; records that
//! arrive while a read is in flight wait on that same read. A failed read is
//! not remembered: the next record to ask starts a new one.
//!
//! Two pieces of state implement this:
//!
//! - `template` is set exactly once, after the first successful read.
//! - `pending` holds the most recent read attempt as a shared future. Its
//!   settled state, not the cache contents, decides whether a caller joins it
//!   or starts a fresh one.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use assign_runtime::{FileReader, RuntimeResult};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, trace, warn};

/// Raw template source.
pub type TemplateBytes = Arc<[u8]>;

type ReadAttempt = Shared<BoxFuture<'static, RuntimeResult<TemplateBytes>>>;

/// Single-assignment cache of a template file.
pub struct TemplateCache {
    path: PathBuf,
    reader: Arc<dyn FileReader>,
    template: OnceLock<TemplateBytes>,
    pending: Mutex<Option<ReadAttempt>>,
}

impl TemplateCache {
    /// Create the cache and start reading `path`.
    ///
    /// When called inside a tokio runtime the read is spawned immediately and
    /// runs in the background. Otherwise it starts when the first caller
    /// awaits [`TemplateCache::get`].
    pub fn new(path: impl Into<PathBuf>, reader: Arc<dyn FileReader>) -> Self {
        let path = path.into();
        let attempt = read_attempt(&path, &reader);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(attempt.clone().map(|_| ()));
            }
            Err(_) => {
                trace!(path = %path.display(), "no async runtime, deferring template read");
            }
        }

        Self {
            path,
            reader,
            template: OnceLock::new(),
            pending: Mutex::new(Some(attempt)),
        }
    }

    /// Path of the template.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a read has succeeded.
    pub fn is_cached(&self) -> bool {
        self.template.get().is_some()
    }

    /// Get the template, reading it if necessary.
    pub async fn get(&self) -> RuntimeResult<TemplateBytes> {
        if let Some(template) = self.template.get() {
            return Ok(Arc::clone(template));
        }

        match self.current_attempt().await {
            Ok(template) => {
                let template = self.template.get_or_init(|| template);
                Ok(Arc::clone(template))
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read template");
                Err(err)
            }
        }
    }

    /// The attempt to wait on: the pending one unless it already failed.
    fn current_attempt(&self) -> ReadAttempt {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(attempt) = pending.as_ref() {
            if !matches!(attempt.peek(), Some(Err(_))) {
                return attempt.clone();
            }
            debug!(path = %self.path.display(), "previous template read failed, retrying");
        }

        let attempt = read_attempt(&self.path, &self.reader);
        *pending = Some(attempt.clone());
        attempt
    }
}

impl std::fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCache")
            .field("path", &self.path)
            .field("reader", &self.reader.name())
            .field("cached", &self.is_cached())
            .finish()
    }
}

fn read_attempt(path: &Path, reader: &Arc<dyn FileReader>) -> ReadAttempt {
    let path = path.to_path_buf();
    let reader = Arc::clone(reader);
    async move {
        debug!(path = %path.display(), reader = reader.name(), "reading template");
        reader.file_read(&path).await.map(TemplateBytes::from)
    }
    .boxed()
    .shared()
}
