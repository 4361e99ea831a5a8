/*
 * engine/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Rendering engine abstraction.
 */

//! Rendering engines.
//!
//! The transform treats the template engine as a black box behind
//! [`RenderEngine`]: it hands over one record whose payload is the template
//! source and whose side data is the render data, and gets back either the
//! rendered record or an error. The rendered record's path extension names
//! the output format.
//!
//! Engines that report their result through a callback instead of a return
//! value implement [`EventEngine`] and are adapted with [`OneShot`].
//!
//! # Implementations
//!
//! - [`TeraEngine`] - Tera templates (default)
//! - [`OneShot`] - adapter for callback-style engines

mod event;
mod tera_engine;

use async_trait::async_trait;
use thiserror::Error;

use crate::options::EngineOptions;
use crate::record::File;

pub use event::{EngineEvent, EngineEvents, EventEngine, OneShot};
pub use tera_engine::TeraEngine;

/// Errors reported by rendering engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The template failed to compile or render. The text is the engine's own
    /// diagnostic.
    #[error("{0}")]
    Template(String),

    /// The record handed to the engine has no template source.
    #[error("Expected the template source as a buffer, but the payload was {0}.")]
    MissingTemplate(crate::record::ContentsKind),

    /// The template source is not valid UTF-8.
    #[error("Template is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    /// The engine finished without reporting a result.
    #[error("Rendering engine finished without emitting a result.")]
    Closed,
}

/// A template engine.
///
/// `render` receives a record whose payload is the raw template and whose
/// side data is the render data mapping, together with the full options
/// mapping. It returns the rendered record.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Render one record.
    async fn render(&self, input: File, options: &EngineOptions) -> Result<File, EngineError>;
}
