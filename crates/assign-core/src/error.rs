/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for the assign-to-template transform.
 */

//! Error types for the transform.
//!
//! [`ConstructionError`] is returned synchronously when a stage is built from
//! invalid arguments. [`PluginError`] is the envelope for every per-record
//! failure; it carries the offending record's path in `file_name` except for
//! template-read failures, which concern the template rather than the record.

use std::path::{Path, PathBuf};

use assign_runtime::RuntimeError;
use serde_json::Value;
use thiserror::Error;

/// Name reported as the origin of every [`PluginError`].
pub const PLUGIN_NAME: &str = "assign-to-template";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Render a value for use inside an error message.
pub fn describe_value(value: &Value) -> String {
    value.to_string()
}

/// Error building a stage from its arguments.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// Wrong number of positional arguments.
    #[error("Expected 1 or 2 arguments (<template path>[, <options>]), but received {got}.")]
    ArgumentCount { got: usize },

    /// The template path is not a string.
    #[error(
        "{value} is not a string. The first argument to assign-to-template must be a path to a template file."
    )]
    InvalidTemplatePath { value: String },

    /// `varName` is present but not a string.
    #[error("{value} is not a string. `varName` option must be a string.")]
    InvalidVarName { value: String },

    /// Options are present but not a mapping.
    #[error(
        "{value} is not an object. The second argument to assign-to-template must be an options object."
    )]
    InvalidOptions { value: String },

    /// A stage configuration document could not be parsed.
    #[error("Invalid stage configuration: {0}")]
    Config(String),
}

impl ConstructionError {
    /// Whether this is an out-of-range error (argument count).
    pub fn is_range_error(&self) -> bool {
        matches!(self, Self::ArgumentCount { .. })
    }

    /// Whether this is a type error (an argument has the wrong type).
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTemplatePath { .. } | Self::InvalidVarName { .. } | Self::InvalidOptions { .. }
        )
    }
}

/// Category of a per-record failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The template could not be read.
    TemplateRead,
    /// The chunk is not a file record.
    InvalidRecord,
    /// The record carries a stream payload.
    UnsupportedStream,
    /// The engine failed, or the record could not be prepared for it.
    Render,
}

/// Envelope for every error emitted by the stage.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PluginError {
    plugin: &'static str,
    kind: ErrorKind,
    message: String,
    file_name: Option<PathBuf>,
    code: Option<&'static str>,
    #[source]
    source: Option<BoxError>,
}

impl PluginError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            plugin: PLUGIN_NAME,
            kind,
            message: message.into(),
            file_name: None,
            code: None,
            source: None,
        }
    }

    fn with_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_name = Some(path.into());
        self
    }

    fn with_source(mut self, source: BoxError) -> Self {
        self.source = Some(source);
        self
    }

    /// The template could not be read. Not tagged with a file name.
    pub fn template_read(err: RuntimeError) -> Self {
        let mut this = Self::new(ErrorKind::TemplateRead, err.to_string());
        this.code = err.code();
        this.with_source(Box::new(err))
    }

    /// A chunk that is not a file record was written to the stage.
    pub fn invalid_record(value: &Value) -> Self {
        let this = Self::new(
            ErrorKind::InvalidRecord,
            format!(
                "{} is not a file record. {} expects records with a path, contents and a clone capability.",
                describe_value(value),
                PLUGIN_NAME
            ),
        );
        match value.get("path").and_then(Value::as_str) {
            Some(path) => this.with_file_name(path),
            None => this,
        }
    }

    /// The record's payload is a stream.
    pub fn unsupported_stream(path: &Path) -> Self {
        Self::new(ErrorKind::UnsupportedStream, "Stream file is not supported.").with_file_name(path)
    }

    /// Rendering failed for the record at `path`; the cause's text is kept verbatim.
    pub fn render(err: impl Into<BoxError>, path: &Path) -> Self {
        let err = err.into();
        Self::new(ErrorKind::Render, err.to_string())
            .with_file_name(path)
            .with_source(err)
    }

    /// Name of the plugin that raised the error.
    pub fn plugin(&self) -> &'static str {
        self.plugin
    }

    /// Failure category.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Path of the record that failed, when the failure concerns a record.
    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    /// Errno-style code of an underlying filesystem failure.
    pub fn code(&self) -> Option<&'static str> {
        self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_construction_error_classes() {
        let err = ConstructionError::ArgumentCount { got: 0 };
        assert!(err.is_range_error());
        assert!(!err.is_type_error());
        assert!(err.to_string().contains("received 0"));

        let err = ConstructionError::InvalidVarName {
            value: describe_value(&json!([123, null])),
        };
        assert!(err.is_type_error());
        assert_eq!(
            err.to_string(),
            "[123,null] is not a string. `varName` option must be a string."
        );
    }

    #[test]
    fn test_template_read_error_has_code_and_no_file_name() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err = PluginError::template_read(RuntimeError::io("missing.tera", io));
        assert_eq!(err.kind(), ErrorKind::TemplateRead);
        assert_eq!(err.code(), Some("ENOENT"));
        assert!(err.file_name().is_none());
        assert_eq!(err.plugin(), PLUGIN_NAME);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_render_error_keeps_message_verbatim() {
        let err = PluginError::render("This is not a valid file record.", Path::new("quux.txt"));
        assert_eq!(err.message(), "This is not a valid file record.");
        assert_eq!(err.to_string(), "This is not a valid file record.");
        assert_eq!(err.file_name(), Some(Path::new("quux.txt")));
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_invalid_record_uses_path_field() {
        let err = PluginError::invalid_record(&json!({"path": "odd.txt", "size": 3}));
        assert_eq!(err.kind(), ErrorKind::InvalidRecord);
        assert_eq!(err.file_name(), Some(Path::new("odd.txt")));
        assert!(err.message().starts_with("{\"path\":\"odd.txt\",\"size\":3} is not a file record."));

        let err = PluginError::invalid_record(&json!(42));
        assert!(err.file_name().is_none());
    }

    #[test]
    fn test_stream_error_message() {
        let err = PluginError::unsupported_stream(Path::new("s.txt"));
        assert_eq!(err.message(), "Stream file is not supported.");
        assert_eq!(err.file_name(), Some(Path::new("s.txt")));
    }
}
