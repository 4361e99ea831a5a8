/*
 * observer.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Observer for per-record stage events.
 */

//! Observer abstraction for stage execution.
//!
//! The stage runner reports every record it starts, finishes or fails
//! through a [`StageObserver`]. All methods default to no-ops, so an observer
//! only implements the events it cares about.

use std::path::Path;

use crate::error::PluginError;

/// Observer for stage execution events.
///
/// Implementations must be `Send + Sync`: the runner calls them from the task
/// driving the stage.
pub trait StageObserver: Send + Sync {
    /// Called before a chunk is handed to the stage.
    ///
    /// `path` is `None` for non-record chunks without a `path` field.
    fn on_record_start(&self, _stage: &str, _index: usize, _path: Option<&Path>) {}

    /// Called when a chunk produced a record.
    fn on_record_complete(&self, _stage: &str, _index: usize, _path: &Path) {}

    /// Called when a chunk failed.
    fn on_record_error(&self, _stage: &str, _index: usize, _error: &PluginError) {}

    /// Called once when the input ends or the output is dropped.
    fn on_end(&self, _stage: &str, _processed: usize) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl NoopObserver {
    /// Create a new no-op observer.
    pub fn new() -> Self {
        Self
    }
}

impl StageObserver for NoopObserver {}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TracingObserver {
    /// Create a new tracing observer.
    pub fn new() -> Self {
        Self
    }
}

impl StageObserver for TracingObserver {
    fn on_record_start(&self, stage: &str, index: usize, path: Option<&Path>) {
        tracing::trace!(
            stage = stage,
            index = index,
            path = ?path,
            "record start"
        );
    }

    fn on_record_complete(&self, stage: &str, index: usize, path: &Path) {
        tracing::debug!(
            stage = stage,
            index = index,
            path = %path.display(),
            "record complete"
        );
    }

    fn on_record_error(&self, stage: &str, index: usize, error: &PluginError) {
        tracing::warn!(
            stage = stage,
            index = index,
            file = ?error.file_name(),
            error = %error,
            "record failed"
        );
    }

    fn on_end(&self, stage: &str, processed: usize) {
        tracing::debug!(stage = stage, processed = processed, "stage input ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Chunk, File, FileRecord};
    use crate::stage::{FileStage, spawn_stage_with_observer};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl StageObserver for RecordingObserver {
        fn on_record_start(&self, stage: &str, index: usize, path: Option<&Path>) {
            self.push(format!("start {stage} {index} {path:?}"));
        }

        fn on_record_complete(&self, stage: &str, index: usize, path: &Path) {
            self.push(format!("complete {stage} {index} {}", path.display()));
        }

        fn on_record_error(&self, stage: &str, index: usize, _error: &PluginError) {
            self.push(format!("error {stage} {index}"));
        }

        fn on_end(&self, stage: &str, processed: usize) {
            self.push(format!("end {stage} {processed}"));
        }
    }

    struct Passthrough;

    #[async_trait]
    impl FileStage for Passthrough {
        fn name(&self) -> &str {
            "pass"
        }

        async fn run(&self, chunk: Chunk) -> Result<Box<dyn FileRecord>, PluginError> {
            match chunk {
                Chunk::File(file) => Ok(file),
                Chunk::Value(value) => Err(PluginError::invalid_record(&value)),
            }
        }
    }

    #[test]
    fn test_noop_observer() {
        let observer = NoopObserver::new();
        observer.on_record_start("s", 0, None);
        observer.on_record_complete("s", 0, Path::new("a"));
        observer.on_end("s", 1);
    }

    #[tokio::test]
    async fn test_runner_reports_each_record() {
        let observer = Arc::new(RecordingObserver::default());
        let (writer, output) =
            spawn_stage_with_observer(Arc::new(Passthrough), 4, observer.clone());

        writer.write(File::new("a.txt")).await.unwrap();
        writer.write(serde_json::json!(null)).await.unwrap();
        writer.end();
        let events = output.collect().await;
        assert_eq!(events.len(), 2);

        let recorded = observer.events.lock().unwrap().clone();
        assert_eq!(
            recorded,
            vec![
                "start pass 0 Some(\"a.txt\")".to_string(),
                "complete pass 0 a.txt".to_string(),
                "start pass 1 None".to_string(),
                "error pass 1".to_string(),
                "end pass 2".to_string(),
            ]
        );
    }
}
