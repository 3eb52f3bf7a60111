//! Action tags embedded in model output.
//!
//! Models ask the front end to do things by embedding tags of the form
//! `[ACTION:TYPE]{json}[/ACTION]` in otherwise ordinary prose. The closing
//! tag is optional: a payload also ends at the next `[ACTION:` or at the end
//! of the text. Everything here is a pure function over a string.

use crate::extract_balanced;
use derive_getters::Getters;
use scrivener_error::ActionError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const OPEN_PREFIX: &str = "[ACTION:";
const CLOSE_TAG: &str = "[/ACTION]";
const USER_INPUT_MACRO: &str = "{{userinput}}";

/// An untyped instruction parsed from model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Action {
    /// Tag type, e.g. `NAVIGATE`
    #[serde(rename = "type")]
    action_type: String,
    /// Parsed JSON payload
    payload: serde_json::Value,
}

impl Action {
    /// Creates an action.
    pub fn new(action_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            action_type: action_type.into(),
            payload,
        }
    }

    /// Validates the payload against the known vocabulary.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] for unknown types and for payloads that do
    /// not match the schema of their type.
    pub fn to_ui_action(&self) -> Result<UiAction, ActionError> {
        let tagged = serde_json::json!({
            "type": self.action_type,
            "payload": self.payload,
        });
        serde_json::from_value(tagged)
            .map_err(|e| ActionError::new(self.action_type.clone(), e.to_string()))
    }
}

/// The action vocabulary understood by front ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum UiAction {
    /// Create the folder structure for a new project.
    CreateProjectFolders {
        /// Project name
        name: String,
    },
    /// Select reference sets for the current project.
    SelectReference {
        /// Kind of set (worldview, character, outline, ...)
        #[serde(default)]
        set_type: Option<String>,
        /// Set id
        #[serde(default)]
        set_id: Option<String>,
        /// Set name, when the id is unknown
        #[serde(default)]
        name: Option<String>,
    },
    /// Switch the front end to another view.
    Navigate {
        /// View name
        target: String,
    },
    /// Run the batch write engine.
    StartAutoWrite {
        /// Outline set to write from
        #[serde(default)]
        outline_set_id: Option<String>,
        /// First outline index
        #[serde(default)]
        start_index: Option<usize>,
        /// Volume to file new chapters into
        #[serde(default)]
        target_volume_id: Option<String>,
        /// Include the full outline digest in each prompt
        #[serde(default)]
        include_full_outline: bool,
    },
    /// Fill a generation form and submit it.
    FillAndGenerate {
        /// Form or set type to generate
        target: String,
        /// Instruction typed into the form
        #[serde(default)]
        prompt: String,
    },
    /// Ask for the task currently executing.
    GetCurrentTask {},
    /// Ask for the whole manifest.
    GetManifest {},
    /// Stop and wait for the user.
    AwaitUserInput {
        /// Message shown to the user
        #[serde(default)]
        message: String,
    },
}

/// One recognised tag run inside a text.
struct TagRun<'a> {
    /// Byte offset of `[ACTION:`
    start: usize,
    /// Byte offset just past the run
    end: usize,
    action_type: &'a str,
    payload: &'a str,
}

/// Finds every tag run, left to right and non-overlapping.
fn scan(text: &str) -> Vec<TagRun<'_>> {
    let mut runs = Vec::new();
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(OPEN_PREFIX) {
        let start = cursor + found;
        let type_start = start + OPEN_PREFIX.len();

        let type_len = text[type_start..]
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(text.len() - type_start);
        let type_end = type_start + type_len;

        if type_len == 0 || !text[type_end..].starts_with(']') {
            // Not a tag; keep looking past this bracket.
            cursor = type_start;
            continue;
        }

        let payload_start = type_end + 1;
        let rest = &text[payload_start..];
        let close = rest.find(CLOSE_TAG);
        let next_open = rest.find(OPEN_PREFIX);

        let (payload, end) = match (close, next_open) {
            (Some(c), Some(n)) if n < c => unclosed_run(rest, payload_start, n),
            (Some(c), _) => (&rest[..c], payload_start + c + CLOSE_TAG.len()),
            (None, Some(n)) => unclosed_run(rest, payload_start, n),
            (None, None) => unclosed_run(rest, payload_start, rest.len()),
        };

        runs.push(TagRun {
            start,
            end,
            action_type: &text[type_start..type_end],
            payload,
        });
        cursor = end;
    }

    runs
}

/// An unclosed run stops after its JSON object when there is one.
fn unclosed_run(rest: &str, payload_start: usize, limit: usize) -> (&str, usize) {
    let candidate = &rest[..limit];
    let leading = candidate.len() - candidate.trim_start().len();

    if candidate[leading..].starts_with('{')
        && let Some(object) = extract_balanced(&candidate[leading..], '{', '}')
    {
        let object_end = leading + object.len();
        return (object, payload_start + object_end);
    }
    (candidate, payload_start + limit)
}

/// Parses every action tag in `text`.
///
/// Payloads that are not valid JSON are logged and skipped; the rest of the
/// text is still scanned.
///
/// # Examples
///
/// ```
/// use scrivener_automation::parse_actions;
///
/// let actions = parse_actions(r#"Done.[ACTION:NAVIGATE]{"target":"outline"}[/ACTION]"#);
/// assert_eq!(actions.len(), 1);
/// assert_eq!(actions[0].action_type(), "NAVIGATE");
/// ```
pub fn parse_actions(text: &str) -> Vec<Action> {
    scan(text)
        .into_iter()
        .filter_map(|run| {
            let raw = run.payload.trim();
            match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(payload) => {
                    debug!(action_type = run.action_type, "Parsed action");
                    Some(Action::new(run.action_type, payload))
                }
                Err(e) => {
                    warn!(
                        action_type = run.action_type,
                        payload = raw,
                        error = %e,
                        "Skipping action with unparseable payload"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Removes every action tag run and trims the result.
///
/// # Examples
///
/// ```
/// use scrivener_automation::clean_text;
///
/// assert_eq!(clean_text(" Hi [ACTION:GET_MANIFEST]{}[/ACTION]"), "Hi");
/// ```
pub fn clean_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut cursor = 0;
    for run in scan(text) {
        cleaned.push_str(&text[cursor..run.start]);
        cursor = run.end;
    }
    cleaned.push_str(&text[cursor..]);
    cleaned.trim().to_string()
}

/// Tests for any action tag, or for one specific type.
///
/// The typed check looks for the literal opening tag only; the payload does
/// not need to be well formed.
pub fn has_action(text: &str, action_type: Option<&str>) -> bool {
    match action_type {
        Some(t) => text.contains(&format!("{}{}]", OPEN_PREFIX, t)),
        None => text.contains(OPEN_PREFIX),
    }
}

/// Replaces every `{{userinput}}` with the instruction.
///
/// # Examples
///
/// ```
/// use scrivener_automation::replace_macros;
///
/// assert_eq!(replace_macros("Write {{userinput}} {{other}}", Some("a duel")), "Write a duel {{other}}");
/// assert_eq!(replace_macros("[{{userinput}}]", None), "[]");
/// ```
pub fn replace_macros(text: &str, instruction: Option<&str>) -> String {
    text.replace(USER_INPUT_MACRO, instruction.unwrap_or(""))
}
