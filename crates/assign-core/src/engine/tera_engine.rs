/*
 * engine/tera_engine.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Tera-based rendering engine.
 */

use std::ffi::OsStr;

use async_trait::async_trait;
use serde_json::Value;
use tera::{Context, Tera};

use super::{EngineError, RenderEngine};
use crate::options::EngineOptions;
use crate::record::{Contents, File, FileRecord, replace_extension};

/// Extension of rendered records when the `extension` option is not set.
pub const DEFAULT_EXTENSION: &str = "html";

/// Engine settings read from the options mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TeraSettings {
    autoescape: bool,
    extension: String,
}

impl TeraSettings {
    fn from_options(options: &EngineOptions) -> Self {
        let autoescape = options
            .get("autoescape")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let extension = options
            .get("extension")
            .and_then(Value::as_str)
            .map(|ext| ext.trim_start_matches('.'))
            .unwrap_or(DEFAULT_EXTENSION)
            .to_string();
        Self {
            autoescape,
            extension,
        }
    }
}

/// Renders Tera templates.
///
/// Each call compiles the template source carried by the input record and
/// renders it with the record's side data as the context.
///
/// Options:
/// - `autoescape` (bool, default `false`): HTML-escape interpolated values
/// - `extension` (string, default `"html"`): extension of the rendered path
///
/// Other keys are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraEngine;

impl TeraEngine {
    /// Create a new Tera engine.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RenderEngine for TeraEngine {
    fn name(&self) -> &str {
        "tera"
    }

    async fn render(&self, input: File, options: &EngineOptions) -> Result<File, EngineError> {
        let settings = TeraSettings::from_options(options);

        let output = {
            let source = match input.payload() {
                Contents::Buffer(bytes) => std::str::from_utf8(bytes)?,
                other => return Err(EngineError::MissingTemplate(other.kind())),
            };
            let data = input.data().cloned().unwrap_or_default();
            let context = Context::from_value(Value::Object(data))
                .map_err(|e| EngineError::Template(error_chain(&e)))?;

            Tera::one_off(source, &context, settings.autoescape)
                .map_err(|e| EngineError::Template(error_chain(&e)))?
        };

        let mut rendered = input;
        let path = replace_extension(rendered.path(), Some(OsStr::new(&settings.extension)));
        rendered.set_path(path);
        rendered.set_contents(output.into_bytes());
        Ok(rendered)
    }
}

/// Join an error and its sources into one message.
///
/// Tera puts the useful part of a parse error (line, column, expected
/// tokens) in the source, not the top-level message.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DataMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::Path;

    fn input(template: &str, data: Value) -> File {
        let data: DataMap = match data {
            Value::Object(map) => map,
            _ => DataMap::new(),
        };
        File::new("foo.txt").with_contents(template).with_data(data)
    }

    #[tokio::test]
    async fn test_renders_with_data() {
        let out = TeraEngine::new()
            .render(
                input("<section>{{ contents }}</section>", json!({"contents": "<a></a>"})),
                &EngineOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(out.contents().unwrap().to_vec()).unwrap(),
            "<section><a></a></section>"
        );
        assert_eq!(out.path(), Path::new("foo.html"));
    }

    #[tokio::test]
    async fn test_autoescape_and_extension_options() {
        let mut options = EngineOptions::new();
        options.insert("autoescape".into(), json!(true));
        options.insert("extension".into(), json!(".xml"));

        let out = TeraEngine::new()
            .render(input("{{ contents }}", json!({"contents": "<b>"})), &options)
            .await
            .unwrap();
        assert_eq!(out.contents(), Some(&b"&lt;b&gt;"[..]));
        assert_eq!(out.path(), Path::new("foo.xml"));
    }

    #[tokio::test]
    async fn test_syntax_error_message_includes_details() {
        let err = TeraEngine::new()
            .render(input("<p>{{ contents </p>", json!({})), &EngineOptions::new())
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Failed to parse"), "unexpected message: {msg}");
        assert!(msg.len() > "Failed to parse".len() + 20);
    }

    #[tokio::test]
    async fn test_missing_variable_is_an_error() {
        let err = TeraEngine::new()
            .render(input("{{ title }}", json!({})), &EngineOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Template(_)));
    }

    #[tokio::test]
    async fn test_requires_buffer_template() {
        let err = TeraEngine::new()
            .render(File::new("x.txt"), &EngineOptions::new())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected the template source as a buffer, but the payload was null."
        );

        let err = TeraEngine::new()
            .render(
                File::new("x.txt").with_contents(vec![0xff, 0xfe]),
                &EngineOptions::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidEncoding(_)));
    }
}
