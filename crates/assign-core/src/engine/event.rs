/*
 * engine/event.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Adapter for callback-style engines.
 */

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{EngineError, RenderEngine};
use crate::options::EngineOptions;
use crate::record::File;

/// Terminal event of an engine invocation.
#[derive(Debug)]
pub enum EngineEvent {
    /// The rendered record.
    Data(File),
    /// Compile or render failure.
    Error(EngineError),
}

/// Sink for the single terminal event of one invocation.
///
/// Both methods consume the sink, so an invocation reports at most once.
/// Dropping the sink without reporting resolves the invocation with
/// [`EngineError::Closed`].
#[derive(Debug)]
pub struct EngineEvents {
    tx: oneshot::Sender<EngineEvent>,
}

impl EngineEvents {
    /// Report the rendered record.
    pub fn data(self, file: File) {
        self.emit(EngineEvent::Data(file));
    }

    /// Report a failure.
    pub fn error(self, err: EngineError) {
        self.emit(EngineEvent::Error(err));
    }

    fn emit(self, event: EngineEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("engine result discarded, caller is gone");
        }
    }
}

/// An engine driven as a one-shot producer.
///
/// `end` receives the single input and must eventually report through
/// `events`, on the same call or later (for example from a spawned task).
pub trait EventEngine: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Start rendering `input`.
    fn end(&self, input: File, options: &EngineOptions, events: EngineEvents);
}

/// Wraps an [`EventEngine`] as a [`RenderEngine`].
#[derive(Debug)]
pub struct OneShot<E> {
    engine: E,
}

impl<E> OneShot<E> {
    /// Wrap `engine`.
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Unwrap the engine.
    pub fn into_inner(self) -> E {
        self.engine
    }
}

#[async_trait]
impl<E: EventEngine> RenderEngine for OneShot<E> {
    fn name(&self) -> &str {
        self.engine.name()
    }

    async fn render(&self, input: File, options: &EngineOptions) -> Result<File, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.engine.end(input, options, EngineEvents { tx });

        match rx.await {
            Ok(EngineEvent::Data(file)) => Ok(file),
            Ok(EngineEvent::Error(err)) => Err(err),
            Err(_) => Err(EngineError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FileRecord;
    use std::path::{Path, PathBuf};

    /// Uppercases the template on a later task.
    struct DeferredUpper;

    impl EventEngine for DeferredUpper {
        fn name(&self) -> &str {
            "deferred-upper"
        }

        fn end(&self, input: File, _options: &EngineOptions, events: EngineEvents) {
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                let text = String::from_utf8_lossy(input.contents().unwrap_or_default())
                    .to_uppercase();
                let mut out = input;
                out.set_contents(text.into_bytes());
                out.set_path(PathBuf::from("out.txt"));
                events.data(out);
            });
        }
    }

    struct Broken;

    impl EventEngine for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn end(&self, _input: File, _options: &EngineOptions, events: EngineEvents) {
            events.error(EngineError::Template("Invalid value".to_string()));
        }
    }

    struct Silent;

    impl EventEngine for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        fn end(&self, _input: File, _options: &EngineOptions, _events: EngineEvents) {}
    }

    #[tokio::test]
    async fn test_deferred_data_event() {
        let engine = OneShot::new(DeferredUpper);
        assert_eq!(engine.name(), "deferred-upper");

        let out = engine
            .render(File::new("in.txt").with_contents("abc"), &EngineOptions::new())
            .await
            .unwrap();
        assert_eq!(out.contents(), Some(&b"ABC"[..]));
        assert_eq!(out.path(), Path::new("out.txt"));
    }

    #[tokio::test]
    async fn test_error_event() {
        let err = OneShot::new(Broken)
            .render(File::new("in.txt"), &EngineOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value");
    }

    #[tokio::test]
    async fn test_dropped_sink_is_closed() {
        let err = OneShot::new(Silent)
            .render(File::new("in.txt"), &EngineOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Closed));
    }
}
