//! Declarative regex post-processing rules.

use serde::{Deserialize, Serialize};

/// Placement bit: apply to text going into the model.
pub const PLACEMENT_USER_INPUT: u8 = 1;
/// Placement bit: apply to text coming out of the model.
pub const PLACEMENT_AI_OUTPUT: u8 = 2;

/// A find/replace rule applied to prompt or reply text.
///
/// `find_regex` is either a bare pattern or `/pattern/flags`.
///
/// # Examples
///
/// ```
/// use scrivener_core::{RegexScript, PLACEMENT_AI_OUTPUT};
///
/// let script = RegexScript::new("strip-stars", r"\*+", "", PLACEMENT_AI_OUTPUT);
/// assert!(script.applies_to(PLACEMENT_AI_OUTPUT));
/// assert!(!script.applies_to(1));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into), default)]
pub struct RegexScript {
    /// Script identifier
    #[serde(default)]
    id: String,
    /// Human-readable name
    #[serde(default)]
    script_name: String,
    /// Pattern, bare or `/pattern/flags`
    find_regex: String,
    /// Replacement text; `$1` and `$&` are honoured
    #[serde(default)]
    replace_string: String,
    /// Literal strings removed from the result
    #[serde(default)]
    trim_strings: Vec<String>,
    /// Bitmask of placements
    #[serde(default)]
    placement: u8,
    /// Disabled scripts are skipped
    #[serde(default)]
    disabled: bool,
}

impl RegexScript {
    /// Creates an enabled script.
    pub fn new(
        script_name: impl Into<String>,
        find_regex: impl Into<String>,
        replace_string: impl Into<String>,
        placement: u8,
    ) -> Self {
        let script_name = script_name.into();
        Self {
            id: script_name.clone(),
            script_name,
            find_regex: find_regex.into(),
            replace_string: replace_string.into(),
            placement,
            ..Default::default()
        }
    }

    /// Returns a builder for constructing a RegexScript.
    pub fn builder() -> RegexScriptBuilder {
        RegexScriptBuilder::default()
    }

    /// Returns true if the script is enabled for the placement bit.
    pub fn applies_to(&self, placement: u8) -> bool {
        !self.disabled && self.placement & placement != 0
    }
}
