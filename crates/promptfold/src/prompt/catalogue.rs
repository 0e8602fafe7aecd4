//! The numbered tool catalogue.

use crate::error::ConfigError;
use crate::prompt::builder::numbered_list;
use crate::tools::ToolSpec;

/// `N. name: description, args json schema: {json}`, one line per tool,
/// numbered from 1 in input order. Empty for no tools.
///
/// Every schema is validated first; the first invalid one aborts rendering.
pub fn render_catalogue(tools: &[ToolSpec]) -> Result<String, ConfigError> {
    for tool in tools {
        tool.validate_schema()?;
    }
    let entries: Vec<String> = tools.iter().map(ToolSpec::catalogue_entry).collect();
    Ok(numbered_list(&entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_tools_in_input_order() {
        let tools = vec![
            ToolSpec::new("write_file", "Write a file", json!({"type": "object"})),
            ToolSpec::new("finish", "Finish the task", json!({"type": "object"})),
        ];
        let text = render_catalogue(&tools).unwrap();
        assert_eq!(
            text,
            "1. write_file: Write a file, args json schema: {\"type\":\"object\"}\n\
             2. finish: Finish the task, args json schema: {\"type\":\"object\"}"
        );
    }

    #[test]
    fn no_tools_renders_nothing() {
        assert_eq!(render_catalogue(&[]).unwrap(), "");
    }

    #[test]
    fn invalid_schema_aborts() {
        let tools = vec![
            ToolSpec::new("ok", "Fine", json!({"type": "object"})),
            ToolSpec::new("bad", "Broken", json!({"type": "not-a-type"})),
        ];
        let err = render_catalogue(&tools).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidToolSchema { ref tool, .. } if tool == "bad"));
    }
}
