/*
 * transform.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The assign-and-render transform.
 */

//! The assign-and-render transform.
//!
//! For every buffer record, the record's contents are bound to a template
//! variable, the template is rendered, and the record's contents and path
//! extension are replaced with the rendered result:
//!
//! ```text
//! foo.txt: "<a></a>"  +  <section>{{ contents }}</section>  →  foo.html: "<section><a></a></section>"
//! ```
//!
//! Records with no contents pass through untouched. Stream records are
//! rejected. Every failure is reported as a [`PluginError`] for that record;
//! the transform stays usable afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assign_runtime::FileReader;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace};

use crate::cache::TemplateCache;
use crate::engine::{RenderEngine, TeraEngine};
use crate::error::{ConstructionError, PluginError, describe_value};
use crate::options::{AssignOptions, StageConfig};
use crate::record::{
    Chunk, Contents, ContentsKind, File, FileRecord, RecordError, replace_extension,
};
use crate::stage::{FileStage, StageOutput, StageWriter, spawn_stage};

/// Assigns each record's contents to a template variable and renders the
/// template in its place.
///
/// # Example
///
/// ```ignore
/// use assign_core::{AssignOptions, AssignToTemplate, File, FileRecord};
///
/// let transform = AssignToTemplate::new("layout.tera", AssignOptions::new());
/// let file = transform
///     .process(File::new("foo.txt").with_contents("<a></a>"))
///     .await?;
/// assert_eq!(file.path(), std::path::Path::new("foo.html"));
/// ```
pub struct AssignToTemplate {
    template: TemplateCache,
    options: AssignOptions,
    engine: Arc<dyn RenderEngine>,
}

impl AssignToTemplate {
    /// Create a transform reading the template from disk and rendering with
    /// Tera.
    ///
    /// The template read starts immediately when called inside a tokio
    /// runtime.
    pub fn new(template_path: impl Into<PathBuf>, options: AssignOptions) -> Self {
        Self::with_parts(
            template_path,
            options,
            Arc::new(assign_runtime::default_runtime()),
            Arc::new(TeraEngine::new()),
        )
    }

    /// Create a transform with a specific reader and engine.
    pub fn with_parts(
        template_path: impl Into<PathBuf>,
        options: AssignOptions,
        reader: Arc<dyn FileReader>,
        engine: Arc<dyn RenderEngine>,
    ) -> Self {
        let template_path = template_path.into();
        debug!(
            template = %template_path.display(),
            var_name = options.var_name(),
            engine = engine.name(),
            reader = reader.name(),
            "creating assign-to-template transform"
        );
        Self {
            template: TemplateCache::new(template_path, reader),
            options,
            engine,
        }
    }

    /// Create a transform from positional arguments: a template path and an
    /// optional options mapping.
    ///
    /// This is the entry point for hosts that configure stages dynamically.
    ///
    /// # Errors
    ///
    /// - [`ConstructionError::ArgumentCount`] for zero or more than two arguments
    /// - [`ConstructionError::InvalidTemplatePath`] if the path is not a string
    /// - [`ConstructionError::InvalidOptions`] if options are not a mapping
    /// - [`ConstructionError::InvalidVarName`] if `varName` is not a string
    pub fn from_args(args: &[Value]) -> Result<Self, ConstructionError> {
        let (template_path, options) = parse_args(args)?;
        Ok(Self::new(template_path, options))
    }

    /// Create a transform from a parsed stage configuration.
    pub fn from_config(config: StageConfig) -> Result<Self, ConstructionError> {
        let (template_path, options) = config.into_parts()?;
        Ok(Self::new(template_path, options))
    }

    /// Path of the template.
    pub fn template_path(&self) -> &Path {
        self.template.path()
    }

    /// Validated options.
    pub fn options(&self) -> &AssignOptions {
        &self.options
    }

    /// Process one chunk.
    ///
    /// Returns the same record that was passed in, mutated in place, or the
    /// error for this chunk.
    pub async fn process(
        &self,
        chunk: impl Into<Chunk>,
    ) -> Result<Box<dyn FileRecord>, PluginError> {
        let chunk = chunk.into();
        let template = self
            .template
            .get()
            .await
            .map_err(PluginError::template_read)?;

        let mut file = match chunk {
            Chunk::File(file) => file,
            Chunk::Value(value) => return Err(PluginError::invalid_record(&value)),
        };

        match file.contents_kind() {
            ContentsKind::Stream => return Err(PluginError::unsupported_stream(file.path())),
            ContentsKind::Null => {
                trace!(path = %file.path().display(), "no contents, passing through");
                return Ok(file);
            }
            ContentsKind::Buffer => {}
        }

        let input = self
            .render_input(&*file, &template)
            .map_err(|e| PluginError::render(e, file.path()))?;

        let mut rendered = self
            .engine
            .render(input, self.options.engine())
            .await
            .map_err(|e| PluginError::render(e, file.path()))?;

        let contents = match rendered.take_contents() {
            Contents::Buffer(bytes) => bytes,
            other => {
                return Err(PluginError::render(
                    format!(
                        "Rendering engine '{}' produced {} contents instead of a buffer.",
                        self.engine.name(),
                        other.kind()
                    ),
                    file.path(),
                ));
            }
        };

        let path = replace_extension(file.path(), rendered.path().extension());
        debug!(
            from = %file.path().display(),
            to = %path.display(),
            bytes = contents.len(),
            "rendered record"
        );
        file.set_contents(contents);
        file.set_path(path);
        Ok(file)
    }

    /// Spawn this transform as a stage on the current tokio runtime.
    pub fn spawn(self, capacity: usize) -> (StageWriter, StageOutput) {
        spawn_stage(Arc::new(self), capacity)
    }

    /// Build the record handed to the engine: template as payload, the
    /// record's side data plus the bound variable as data.
    fn render_input(&self, file: &dyn FileRecord, template: &[u8]) -> Result<File, RecordError> {
        let mut input = file.clone_without_contents()?;
        input.set_payload(Contents::Buffer(template.to_vec()));

        let mut data = file.data().cloned().unwrap_or_default();
        let text = String::from_utf8_lossy(file.contents().unwrap_or_default()).into_owned();
        data.insert(self.options.var_name().to_string(), Value::String(text));

        Ok(input.with_data(data))
    }
}

impl std::fmt::Debug for AssignToTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignToTemplate")
            .field("template", &self.template)
            .field("options", &self.options)
            .field("engine", &self.engine.name())
            .finish()
    }
}

#[async_trait]
impl FileStage for AssignToTemplate {
    fn name(&self) -> &str {
        "assign-to-template"
    }

    async fn run(&self, chunk: Chunk) -> Result<Box<dyn FileRecord>, PluginError> {
        self.process(chunk).await
    }
}

fn parse_args(args: &[Value]) -> Result<(PathBuf, AssignOptions), ConstructionError> {
    let (path, options) = match args {
        [path] => (path, None),
        [path, options] => (path, Some(options)),
        _ => return Err(ConstructionError::ArgumentCount { got: args.len() }),
    };

    let Value::String(path) = path else {
        return Err(ConstructionError::InvalidTemplatePath {
            value: describe_value(path),
        });
    };

    let options = match options {
        Some(options) => AssignOptions::from_value(options)?,
        None => AssignOptions::default(),
    };

    Ok((PathBuf::from(path), options))
}
