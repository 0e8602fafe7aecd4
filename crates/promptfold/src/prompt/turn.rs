//! Per-turn assembler inputs, loadable from JSON.
//!
//! ```json
//! {
//!   "goals": ["Build a todo app"],
//!   "tools": [{"name": "finish", "description": "Finish", "args_schema": {"type": "object"}}],
//!   "transcript": [
//!     {"role": "system", "content": "wrote src/App.js",
//!      "metadata": {"file_path": "src/App.js", "code": "export default App;"}}
//!   ],
//!   "user_input": "Determine which next command to use"
//! }
//! ```

use crate::tools::ToolSpec;
use crate::Message;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything [`PromptAssembler::assemble`](crate::prompt::PromptAssembler::assemble)
/// needs besides the budget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnInput {
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    #[serde(default)]
    pub transcript: Vec<Message>,
    pub user_input: String,
}

impl TurnInput {
    /// Read and parse a turn file.
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        serde_json::from_str(&text).map_err(|e| format!("invalid turn file {}: {e}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageRole;
    use std::io::Write;

    #[test]
    fn loads_turn_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "goals": ["Build a todo app"],
                "transcript": [
                    {{"role": "system", "content": "wrote",
                      "metadata": {{"file_path": "src/App.js", "code": "App"}}}},
                    {{"role": "user", "content": "next"}}
                ],
                "user_input": "start"
            }}"#
        )
        .unwrap();

        let turn = TurnInput::from_path(file.path()).unwrap();
        assert_eq!(turn.goals, vec!["Build a todo app"]);
        assert!(turn.tools.is_empty());
        assert_eq!(turn.transcript.len(), 2);
        assert_eq!(turn.transcript[0].role, MessageRole::System);
        let meta = turn.transcript[0].metadata.as_ref().unwrap();
        assert_eq!(meta.file_path.as_deref(), Some("src/App.js"));
        assert_eq!(turn.user_input, "start");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = TurnInput::from_path(Path::new("/nonexistent/turn.json")).unwrap_err();
        assert!(err.contains("failed to read"));
    }

    #[test]
    fn user_input_is_required() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"goals": []}}"#).unwrap();
        let err = TurnInput::from_path(file.path()).unwrap_err();
        assert!(err.contains("invalid turn file"));
    }
}
