//! Command descriptions rendered into the prompt's tool catalogue.
//!
//! A [`ToolSpec`] is pure data: the agent loop owns the actual commands. The
//! assembler only needs a name, a one-line description, and a JSON Schema for
//! the arguments, which is checked with `jsonschema` before rendering.

use crate::error::ConfigError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A command the model may choose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Command name, quoted back by the model in its response.
    pub name: String,
    /// One-line purpose.
    pub description: String,
    /// JSON Schema of the command's arguments.
    #[serde(default = "empty_object_schema")]
    pub args_schema: serde_json::Value,
}

fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        args_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            args_schema,
        }
    }

    /// Spec whose argument schema is derived from `T`.
    ///
    /// ```
    /// use promptfold::tools::ToolSpec;
    /// use schemars::JsonSchema;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize, JsonSchema)]
    /// struct WriteFileArgs {
    ///     file_path: String,
    ///     text: String,
    /// }
    ///
    /// let spec = ToolSpec::for_args::<WriteFileArgs>("write_file", "Write a file to disk");
    /// assert_eq!(spec.args_schema["type"], "object");
    /// assert!(spec.validate_schema().is_ok());
    /// ```
    pub fn for_args<T: JsonSchema>(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(name, description, crate::json_schema_for::<T>())
    }

    /// Check that `args_schema` is itself a valid JSON Schema.
    pub fn validate_schema(&self) -> Result<(), ConfigError> {
        jsonschema::validator_for(&self.args_schema)
            .map(|_| ())
            .map_err(|e| ConfigError::InvalidToolSchema {
                tool: self.name.clone(),
                reason: e.to_string(),
            })
    }

    /// The catalogue line for this tool, without the leading number.
    pub fn catalogue_entry(&self) -> String {
        format!(
            "{}: {}, args json schema: {}",
            self.name, self.description, self.args_schema
        )
    }
}
