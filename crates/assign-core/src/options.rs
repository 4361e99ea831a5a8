/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Options and stage configuration.
 */

//! Options and stage configuration.
//!
//! The transform understands exactly one option, `varName`. The whole mapping,
//! `varName` included, is also handed to the rendering engine untouched, so
//! engine-specific keys (`autoescape`, `extension`, ...) live next to it.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ConstructionError, describe_value};

/// Variable the payload is bound to when `varName` is not given.
pub const DEFAULT_VAR_NAME: &str = "contents";

/// Key of the variable-name option.
pub const VAR_NAME_KEY: &str = "varName";

/// Options mapping passed through to the rendering engine.
pub type EngineOptions = Map<String, Value>;

/// Validated transform options.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignOptions {
    var_name: String,
    engine: EngineOptions,
}

impl Default for AssignOptions {
    fn default() -> Self {
        Self {
            var_name: DEFAULT_VAR_NAME.to_string(),
            engine: EngineOptions::new(),
        }
    }
}

impl AssignOptions {
    /// Default options: payload bound to `contents`, no engine options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate an options mapping.
    ///
    /// Only `varName` is checked; every other key is opaque.
    pub fn from_map(map: EngineOptions) -> Result<Self, ConstructionError> {
        let var_name = match map.get(VAR_NAME_KEY) {
            None => DEFAULT_VAR_NAME.to_string(),
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(ConstructionError::InvalidVarName {
                    value: describe_value(other),
                });
            }
        };
        Ok(Self {
            var_name,
            engine: map,
        })
    }

    /// Validate an options value. `null` means defaults.
    pub fn from_value(value: &Value) -> Result<Self, ConstructionError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => Self::from_map(map.clone()),
            other => Err(ConstructionError::InvalidOptions {
                value: describe_value(other),
            }),
        }
    }

    /// Bind the payload to `name` instead of `contents`.
    pub fn with_var_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.engine
            .insert(VAR_NAME_KEY.to_string(), Value::String(name.clone()));
        self.var_name = name;
        self
    }

    /// Add an engine option.
    ///
    /// A string `varName` is applied as with [`AssignOptions::with_var_name`];
    /// any other `varName` value is ignored.
    pub fn with_engine_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == VAR_NAME_KEY {
            return match value {
                Value::String(name) => self.with_var_name(name),
                other => {
                    tracing::warn!(
                        value = %describe_value(&other),
                        "ignoring non-string {}", VAR_NAME_KEY
                    );
                    self
                }
            };
        }
        self.engine.insert(key, value);
        self
    }

    /// Name the payload is bound to in the render data.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }

    /// The full options mapping as seen by the engine.
    pub fn engine(&self) -> &EngineOptions {
        &self.engine
    }
}

/// Declarative stage configuration, e.g. from a build file.
///
/// ```yaml
/// template: layouts/page.tera
/// options:
///   varName: body
///   extension: html
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    /// Path to the template.
    pub template: PathBuf,
    /// Options mapping.
    #[serde(default)]
    pub options: EngineOptions,
}

impl StageConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConstructionError> {
        serde_yaml::from_str(source).map_err(|e| ConstructionError::Config(e.to_string()))
    }

    /// Parse a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self, ConstructionError> {
        serde_json::from_str(source).map_err(|e| ConstructionError::Config(e.to_string()))
    }

    /// Validate the options and split into template path and options.
    pub fn into_parts(self) -> Result<(PathBuf, AssignOptions), ConstructionError> {
        let options = AssignOptions::from_map(self.options)?;
        Ok((self.template, options))
    }
}
