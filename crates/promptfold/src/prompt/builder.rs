//! Plain-text section builder for the system message.
//!
//! Sections render as `Heading:` on its own line followed by the body.
//! Sections are joined with blank lines. Bodies can be plain, numbered
//! (`1. item`), fenced (```` ```json ````), or delimited by `>>>>` / `<<<<`
//! so the model can tell where injected code or logs start and stop.

/// Opening delimiter around injected content.
pub const OPEN_DELIMITER: &str = ">>>>";
/// Closing delimiter around injected content.
pub const CLOSE_DELIMITER: &str = "<<<<";

/// Builder for multi-section prompts.
///
/// # Example
///
/// ```
/// use promptfold::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new("You are a developer.")
///     .numbered("General Instructions", &["Use full paths.", "No user assistance."])
///     .numbered("Commands", &[] as &[&str])
///     .nonempty("Notes", "")
///     .delimited("Last Step", "None")
///     .build();
///
/// assert!(prompt.contains("General Instructions:\n1. Use full paths.\n2. No user assistance."));
/// assert!(prompt.contains("Commands:\n"));
/// assert!(!prompt.contains("Notes:"));
/// assert!(prompt.ends_with("Last Step:\n>>>>\nNone\n<<<<"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<String>,
}

impl PromptBuilder {
    /// Start with a preamble, included as-is. An empty preamble is skipped.
    pub fn new(preamble: impl Into<String>) -> Self {
        Self::default().raw(preamble)
    }

    /// Append a section. The heading is kept even when `content` is empty.
    pub fn section(mut self, heading: &str, content: impl AsRef<str>) -> Self {
        self.sections.push(format!("{heading}:\n{}", content.as_ref()));
        self
    }

    /// Append a section only if `content` is non-empty.
    pub fn nonempty(self, heading: &str, content: impl AsRef<str>) -> Self {
        if content.as_ref().is_empty() {
            self
        } else {
            self.section(heading, content)
        }
    }

    /// Append a numbered list section. The heading is kept with no items.
    pub fn numbered<S: AsRef<str>>(self, heading: &str, items: &[S]) -> Self {
        self.section(heading, numbered_list(items))
    }

    /// Append a numbered list section only if there are items.
    pub fn numbered_nonempty<S: AsRef<str>>(self, heading: &str, items: &[S]) -> Self {
        if items.is_empty() {
            self
        } else {
            self.numbered(heading, items)
        }
    }

    /// Append a fenced code block section.
    pub fn fenced(self, heading: &str, lang: &str, content: impl AsRef<str>) -> Self {
        let body = format!("```{lang}\n{}\n```", content.as_ref());
        self.section(heading, body)
    }

    /// Append a section whose body sits between [`OPEN_DELIMITER`] and
    /// [`CLOSE_DELIMITER`].
    pub fn delimited(self, heading: &str, content: impl AsRef<str>) -> Self {
        let body = format!("{OPEN_DELIMITER}\n{}\n{CLOSE_DELIMITER}", content.as_ref());
        self.section(heading, body)
    }

    /// Append raw text without a heading. Skipped if empty.
    pub fn raw(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.sections.push(content);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Join all sections with blank lines.
    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

/// `1. first\n2. second`, numbered from 1 in input order.
pub fn numbered_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
