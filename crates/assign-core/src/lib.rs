/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Assign a file's contents to a template variable and render it in place.
 */

//! # assign-core
//!
//! A build-pipeline stage that wraps each file in a template. For every file
//! record with a buffer payload, the stage:
//!
//! 1. binds the payload (as UTF-8 text) to a template variable, `contents` by
//!    default, alongside the record's existing side data,
//! 2. renders the template with a [`RenderEngine`] ([`TeraEngine`] by default),
//! 3. replaces the record's payload with the rendered output and its extension
//!    with the one chosen by the engine.
//!
//! The template is read once per stage and shared by every record.
//!
//! ## Example
//!
//! ```ignore
//! use assign_core::{AssignOptions, AssignToTemplate, File};
//!
//! let stage = AssignToTemplate::new("layout.tera", AssignOptions::new().with_var_name("body"));
//! let (writer, mut output) = stage.spawn(assign_core::DEFAULT_CAPACITY);
//! writer.write(File::new("post.md").with_contents("<p>hi</p>")).await?;
//! writer.end();
//! while let Some(event) = output.recv().await {
//!     // ...
//! }
//! ```

pub mod cache;
pub mod engine;
pub mod error;
pub mod observer;
pub mod options;
pub mod record;
pub mod stage;
pub mod transform;

pub use cache::{TemplateBytes, TemplateCache};
pub use engine::{
    EngineError, EngineEvent, EngineEvents, EventEngine, OneShot, RenderEngine, TeraEngine,
};
pub use error::{ConstructionError, ErrorKind, PLUGIN_NAME, PluginError};
pub use observer::{NoopObserver, StageObserver, TracingObserver};
pub use options::{AssignOptions, DEFAULT_VAR_NAME, EngineOptions, StageConfig};
pub use record::{Chunk, Contents, ContentsKind, DataMap, File, FileRecord, RecordError};
pub use stage::{
    DEFAULT_CAPACITY, FileStage, StageClosed, StageEvent, StageOutput, StageWriter, spawn_stage,
    spawn_stage_with_observer,
};
pub use transform::AssignToTemplate;
