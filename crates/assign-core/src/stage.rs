/*
 * stage.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Stage trait and channel-driven stage runner.
 */

//! Pipeline stage plumbing.
//!
//! A [`FileStage`] turns one chunk into one record or one error. To plug a
//! stage into a streaming pipeline, [`spawn_stage`] runs it on a task behind
//! two bounded channels:
//!
//! ```text
//! StageWriter::write ──▶ [chunks] ──▶ FileStage::run ──▶ [events] ──▶ StageOutput::recv
//! ```
//!
//! Chunks are processed one at a time in the order they were written, so a
//! record is never started before the previous one has produced its event.
//! Both channels are bounded: a slow consumer eventually blocks `write`.
//! Dropping (or [`StageWriter::end`]ing) the writer ends the input; once the
//! queued chunks are processed, `recv` returns `None`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::PluginError;
use crate::observer::{StageObserver, TracingObserver};
use crate::record::{Chunk, FileRecord};

/// Default capacity of the stage's input and output channels.
pub const DEFAULT_CAPACITY: usize = 16;

/// A single per-record stage.
///
/// Stages must be `Send + Sync` so they can be shared with the task that
/// drives them. A failed record must not poison the stage: `run` is called
/// again for the next chunk regardless of the previous result.
#[async_trait]
pub trait FileStage: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Process one chunk.
    async fn run(&self, chunk: Chunk) -> Result<Box<dyn FileRecord>, PluginError>;
}

/// Output of a stage for one chunk.
#[derive(Debug)]
pub enum StageEvent {
    /// The processed record.
    Data(Box<dyn FileRecord>),
    /// The chunk failed.
    Error(PluginError),
}

impl StageEvent {
    /// Whether this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(self, StageEvent::Error(_))
    }

    /// The record, if this is a data event.
    pub fn into_data(self) -> Option<Box<dyn FileRecord>> {
        match self {
            StageEvent::Data(file) => Some(file),
            StageEvent::Error(_) => None,
        }
    }

    /// The error, if this is an error event.
    pub fn into_error(self) -> Option<PluginError> {
        match self {
            StageEvent::Data(_) => None,
            StageEvent::Error(err) => Some(err),
        }
    }
}

/// The stage no longer accepts input.
#[derive(Debug, Error)]
#[error("Stage is no longer accepting input")]
pub struct StageClosed;

/// Input side of a running stage.
///
/// There is exactly one writer per stage, so [`StageWriter::end`] (or
/// dropping the writer) always closes the input.
#[derive(Debug)]
pub struct StageWriter {
    tx: mpsc::Sender<Chunk>,
}

impl StageWriter {
    /// Queue a chunk, waiting while the stage is at capacity.
    pub async fn write(&self, chunk: impl Into<Chunk>) -> Result<(), StageClosed> {
        self.tx.send(chunk.into()).await.map_err(|_| StageClosed)
    }

    /// Signal end of input.
    pub fn end(self) {}
}

/// Output side of a running stage.
#[derive(Debug)]
pub struct StageOutput {
    rx: mpsc::Receiver<StageEvent>,
}

impl StageOutput {
    /// Next event, or `None` once input has ended and everything is processed.
    pub async fn recv(&mut self) -> Option<StageEvent> {
        self.rx.recv().await
    }

    /// Drain all remaining events.
    pub async fn collect(mut self) -> Vec<StageEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }
}

/// Run `stage` on a new task, reporting through a [`TracingObserver`].
///
/// Must be called from within a tokio runtime.
pub fn spawn_stage(stage: Arc<dyn FileStage>, capacity: usize) -> (StageWriter, StageOutput) {
    spawn_stage_with_observer(stage, capacity, Arc::new(TracingObserver::new()))
}

/// Run `stage` on a new task with a custom observer.
pub fn spawn_stage_with_observer(
    stage: Arc<dyn FileStage>,
    capacity: usize,
    observer: Arc<dyn StageObserver>,
) -> (StageWriter, StageOutput) {
    let capacity = capacity.max(1);
    let (input_tx, mut input_rx) = mpsc::channel::<Chunk>(capacity);
    let (output_tx, output_rx) = mpsc::channel::<StageEvent>(capacity);

    tokio::spawn(async move {
        let name = stage.name().to_string();
        let mut index = 0;

        while let Some(chunk) = input_rx.recv().await {
            observer.on_record_start(&name, index, chunk.path().as_deref());

            let event = match stage.run(chunk).await {
                Ok(file) => {
                    observer.on_record_complete(&name, index, file.path());
                    StageEvent::Data(file)
                }
                Err(err) => {
                    observer.on_record_error(&name, index, &err);
                    StageEvent::Error(err)
                }
            };
            index += 1;

            if output_tx.send(event).await.is_err() {
                debug!(stage = %name, "stage output dropped, stopping");
                break;
            }
        }

        observer.on_end(&name, index);
    });

    (StageWriter { tx: input_tx }, StageOutput { rx: output_rx })
}
