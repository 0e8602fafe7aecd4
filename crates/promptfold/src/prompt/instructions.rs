//! Static instruction sections of the system message.
//!
//! An [`InstructionSet`] never changes between turns of the same agent. It
//! renders, in order: the role preamble, the goals, general instructions,
//! any domain-specific lists, the tool catalogue, the performance-evaluation
//! checklist, and the JSON response format.

use crate::error::ConfigError;
use crate::prompt::builder::PromptBuilder;
use serde::{Deserialize, Serialize};

/// A titled numbered list of domain-specific instructions,
/// e.g. "For ReactJS Projects".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInstructions {
    pub heading: String,
    pub items: Vec<String>,
}

/// Everything in the system message that does not depend on the transcript.
///
/// Deserializable so the CLI can load it from a JSON file; missing fields
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructionSet {
    /// Role and scenario text opening the system message.
    pub role: String,
    /// Heading above the goal list.
    pub goals_heading: String,
    pub general: Vec<String>,
    pub domains: Vec<DomainInstructions>,
    pub performance_evaluation: Vec<String>,
    /// Pretty-printed JSON the model must answer with. Omitted when `None`.
    pub response_format: Option<String>,
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self {
            role: String::new(),
            goals_heading: "Specifications".to_string(),
            general: Vec::new(),
            domains: Vec::new(),
            performance_evaluation: Vec::new(),
            response_format: None,
        }
    }
}

impl InstructionSet {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Self::default()
        }
    }

    pub fn with_goals_heading(mut self, heading: impl Into<String>) -> Self {
        self.goals_heading = heading.into();
        self
    }

    pub fn with_general<S: Into<String>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.general = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_domain<S: Into<String>>(
        mut self,
        heading: impl Into<String>,
        items: impl IntoIterator<Item = S>,
    ) -> Self {
        self.domains.push(DomainInstructions {
            heading: heading.into(),
            items: items.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_performance_evaluation<S: Into<String>>(
        mut self,
        items: impl IntoIterator<Item = S>,
    ) -> Self {
        self.performance_evaluation = items.into_iter().map(Into::into).collect();
        self
    }

    /// Render `template` as the response format, four-space indented and
    /// in field declaration order.
    pub fn with_response_format<T: Serialize>(mut self, template: &T) -> Result<Self, ConfigError> {
        self.response_format = Some(pretty_json(template)?);
        Ok(self)
    }

    /// Render every static section, with `catalogue` as the Commands body.
    pub fn render(&self, goals: &[String], catalogue: &str) -> String {
        let mut builder = PromptBuilder::new(self.role.trim())
            .section(&self.goals_heading, goals.join("\n"))
            .numbered_nonempty("General Instructions", &self.general);
        for domain in &self.domains {
            builder = builder.numbered_nonempty(&domain.heading, &domain.items);
        }
        builder = builder
            .section("Commands", catalogue)
            .numbered_nonempty("Performance Evaluation", &self.performance_evaluation);
        if let Some(format) = &self.response_format {
            builder = builder.fenced("Response Format", "json", format);
        }
        builder.build()
    }
}

fn pretty_json<T: Serialize>(value: &T) -> Result<String, ConfigError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| ConfigError::InvalidResponseFormat(e.to_string()))?;
    String::from_utf8(out).map_err(|e| ConfigError::InvalidResponseFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Reply {
        thoughts: &'static str,
        command: Command,
    }

    #[derive(Serialize)]
    struct Command {
        name: &'static str,
    }

    fn sample() -> InstructionSet {
        InstructionSet::new("You are a developer.\n")
            .with_general(["No user assistance.", "Use full paths."])
            .with_domain("For ReactJS Projects", ["Write tests first."])
            .with_performance_evaluation(["Review progress."])
    }

    #[test]
    fn sections_render_in_order() {
        let text = sample().render(&["Build a todo app".into()], "1. cli: Run commands");
        let order = [
            "You are a developer.",
            "Specifications:\nBuild a todo app",
            "General Instructions:\n1. No user assistance.\n2. Use full paths.",
            "For ReactJS Projects:\n1. Write tests first.",
            "Commands:\n1. cli: Run commands",
            "Performance Evaluation:\n1. Review progress.",
        ];
        let mut last = 0;
        for part in order {
            let at = text.find(part).unwrap_or_else(|| panic!("missing {part:?}"));
            assert!(at >= last, "{part:?} out of order");
            last = at;
        }
    }

    #[test]
    fn empty_goals_and_catalogue_keep_headers() {
        let text = sample().render(&[], "");
        assert!(text.contains("Specifications:\n"));
        assert!(text.contains("Commands:\n"));
    }

    #[test]
    fn empty_lists_are_omitted() {
        let text = InstructionSet::new("Role").render(&[], "");
        assert!(!text.contains("General Instructions"));
        assert!(!text.contains("Performance Evaluation"));
        assert!(!text.contains("Response Format"));
    }

    #[test]
    fn loads_from_partial_json() {
        let set: InstructionSet = serde_json::from_str(
            r#"{"role": "You are a developer.", "domains": [{"heading": "For Rust", "items": ["Run cargo test."]}]}"#,
        )
        .unwrap();
        assert_eq!(set.goals_heading, "Specifications");
        let text = set.render(&[], "");
        assert!(text.contains("For Rust:\n1. Run cargo test."));
    }

    #[test]
    fn response_format_keeps_field_order_and_indent() {
        let set = InstructionSet::new("Role")
            .with_response_format(&Reply {
                thoughts: "plan",
                command: Command { name: "command name" },
            })
            .unwrap();
        let format = set.response_format.as_deref().unwrap();
        assert_eq!(
            format,
            "{\n    \"thoughts\": \"plan\",\n    \"command\": {\n        \"name\": \"command name\"\n    }\n}"
        );
        assert!(set.render(&[], "").ends_with("```json\n{\n    \"thoughts\": \"plan\",\n    \"command\": {\n        \"name\": \"command name\"\n    }\n}\n```"));
    }
}
