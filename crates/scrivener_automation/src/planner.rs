//! Turns a user instruction into a task manifest with one model call.

use crate::{Manifest, TaskType, outer_object_span, strip_code_fences};
use scrivener_core::{GenerateRequest, Message, Novel};
use scrivener_error::{AgentError, AgentErrorKind, ScrivenerResult};
use scrivener_interface::CompletionDriver;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{debug, instrument, warn};

const ACTION_VOCABULARY: &str = "\
- [ACTION:CREATE_PROJECT_FOLDERS]{\"name\": \"...\"}[/ACTION]
- [ACTION:SELECT_REFERENCE]{\"setType\": \"worldview\", \"setId\": \"...\"}[/ACTION]
- [ACTION:NAVIGATE]{\"target\": \"...\"}[/ACTION]
- [ACTION:START_AUTO_WRITE]{\"outlineSetId\": \"...\", \"startIndex\": 0}[/ACTION]
- [ACTION:FILL_AND_GENERATE]{\"target\": \"worldview\", \"prompt\": \"...\"}[/ACTION]
- [ACTION:GET_CURRENT_TASK]{}[/ACTION]
- [ACTION:GET_MANIFEST]{}[/ACTION]
- [ACTION:AWAIT_USER_INPUT]{\"message\": \"...\"}[/ACTION]";

/// Plans the whole creative pipeline up front.
pub struct ManifestPlanner {
    driver: Arc<dyn CompletionDriver>,
    temperature: Option<f32>,
}

impl ManifestPlanner {
    /// Creates a planner that talks to `driver`.
    pub fn new(driver: Arc<dyn CompletionDriver>) -> Self {
        Self {
            driver,
            temperature: None,
        }
    }

    /// Sets the sampling temperature for planning requests.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sends the planning request and parses the reply.
    ///
    /// # Errors
    ///
    /// Propagates driver errors, and returns
    /// [`AgentErrorKind::ManifestParse`] when the reply holds no manifest.
    #[instrument(skip(self, novel), fields(model = self.driver.model_name()))]
    pub async fn plan(&self, novel: &Novel, instruction: &str) -> ScrivenerResult<Manifest> {
        let request = GenerateRequest::builder()
            .messages(vec![
                Message::system(build_system_prompt()),
                Message::user(build_user_prompt(novel, instruction)),
            ])
            .temperature(self.temperature)
            .build()
            .map_err(|e| AgentError::new(AgentErrorKind::PlanningFailed(e.to_string())))?;

        let response = self.driver.generate(&request).await?;
        debug!(length = response.content().len(), "Planner replied");

        let manifest = parse_manifest(response.content())
            .ok_or_else(|| AgentError::new(AgentErrorKind::ManifestParse))?;
        debug!(tasks = manifest.len(), "Parsed manifest");
        Ok(manifest)
    }
}

/// Fixed instructions describing the manifest format and tool tags.
pub fn build_system_prompt() -> String {
    let task_types: Vec<String> = TaskType::iter().map(|t| t.to_string()).collect();

    format!(
        "You are the director of an AI novel-writing studio. Plan the complete \
workflow needed to satisfy the user's request, from first inspiration to finished \
chapters, before anything is executed.\n\n\
Reply with a single JSON object and nothing else:\n\
{{\"tasks\": [{{\"id\": \"1\", \"type\": \"<task type>\", \"title\": \"...\", \
\"description\": \"...\"}}], \"currentTaskIndex\": 0}}\n\n\
Valid task types, in their usual order: {}.\n\n\
A task description may embed tool calls that the application will perform:\n{}\n\n\
Use {{{{userinput}}}} wherever the user's original wording should be inserted.",
        task_types.join(", "),
        ACTION_VOCABULARY
    )
}

/// Describes the project state and restates the instruction.
pub fn build_user_prompt(novel: &Novel, instruction: &str) -> String {
    let story = novel.story_chapter_count();
    let written = novel
        .chapters()
        .iter()
        .filter(|c| c.is_story() && c.is_written())
        .count();

    format!(
        "Project: \"{}\"\n\
Chapters: {} ({} written)\n\
Worldview sets: {}, character sets: {}, outline sets: {}\n\n\
Instruction: {}",
        novel.title(),
        story,
        written,
        novel.worldview_sets().len(),
        novel.character_sets().len(),
        novel.outline_sets().len(),
        instruction
    )
}

/// Extracts a manifest from noisy model output.
///
/// Never fails loudly: anything unparseable yields `None` and the raw text
/// is logged.
///
/// # Examples
///
/// ```
/// use scrivener_automation::parse_manifest;
///
/// let raw = "Sure! ```json\n{\"tasks\":[],\"currentTaskIndex\":0}\n```\nEnjoy!";
/// let manifest = parse_manifest(raw).unwrap();
/// assert!(manifest.is_empty());
///
/// assert!(parse_manifest("{\"tasks\": [").is_none());
/// ```
pub fn parse_manifest(raw: &str) -> Option<Manifest> {
    let Some(span) = outer_object_span(raw) else {
        warn!(raw, "No JSON object in planner response");
        return None;
    };

    let cleaned = strip_code_fences(span);
    match serde_json::from_str::<Manifest>(cleaned.trim()) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            warn!(error = %e, raw, "Failed to parse manifest");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_core::Chapter;

    #[test]
    fn test_parse_manifest_with_tasks() {
        let raw = r#"Here is the plan:
{"tasks": [
  {"id": "1", "type": "worldview", "title": "World", "description": "Build it"},
  {"id": "2", "type": "chapter", "title": "Write"}
], "currentTaskIndex": 0}
Let me know!"#;

        let manifest = parse_manifest(raw).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(*manifest.tasks()[1].task_type(), TaskType::Chapter);
    }

    #[test]
    fn test_parse_manifest_rejects_missing_tasks() {
        assert!(parse_manifest(r#"{"currentTaskIndex": 0}"#).is_none());
        assert!(parse_manifest("no json here").is_none());
    }

    #[test]
    fn test_user_prompt_counts_chapters() {
        let mut written = Chapter::new(1, "One");
        written.set_content("Text");
        let novel = Novel::builder()
            .title("Tides")
            .chapters(vec![written, Chapter::new(2, "Two")])
            .build()
            .unwrap();

        let prompt = build_user_prompt(&novel, "finish the book");
        assert!(prompt.contains("Chapters: 2 (1 written)"));
        assert!(prompt.ends_with("Instruction: finish the book"));
    }

    #[test]
    fn test_system_prompt_lists_types_and_macro() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("plot_outline"));
        assert!(prompt.contains("{{userinput}}"));
        assert!(prompt.contains("[ACTION:START_AUTO_WRITE]"));
    }
}
