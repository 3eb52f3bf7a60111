//! Interpreter for declarative regex post-processing scripts.
//!
//! Patterns are either bare (`\*+`, replaced globally) or written in
//! `/pattern/flags` notation with flags `g`, `i`, `m` and `s`. Without `g`
//! only the first match is replaced. Replacements use `$1`, `$<name>` and
//! `$&` for the whole match.

use regex::{Regex, RegexBuilder};
use scrivener_core::RegexScript;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Cumulative work after which the async interpreter yields to the runtime.
const YIELD_BUDGET: Duration = Duration::from_millis(50);

/// A compiled script pattern.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    global: bool,
}

impl CompiledPattern {
    /// Compiles a bare or slash-delimited pattern.
    ///
    /// # Errors
    ///
    /// Returns the regex error for invalid patterns.
    pub fn compile(find: &str) -> Result<Self, regex::Error> {
        let (pattern, flags) = split_flags(find);
        let global = flags.is_none_or(|f| f.contains('g'));
        let flags = flags.unwrap_or("");

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build()?;

        Ok(Self { regex, global })
    }

    /// Whether every match is replaced.
    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Applies the pattern with a JS-style replacement template.
    pub fn replace(&self, text: &str, replacement: &str) -> String {
        let template = translate_replacement(replacement);
        if self.global {
            self.regex.replace_all(text, template.as_str()).into_owned()
        } else {
            self.regex.replace(text, template.as_str()).into_owned()
        }
    }
}

/// Splits `/pattern/flags` into its parts; anything else is a bare pattern.
fn split_flags(find: &str) -> (&str, Option<&str>) {
    if let Some(body) = find.strip_prefix('/')
        && let Some(last) = body.rfind('/')
    {
        let flags = &body[last + 1..];
        if flags.chars().all(|c| "gimsuy".contains(c)) {
            return (&body[..last], Some(flags));
        }
    }
    (find, None)
}

/// Rewrites JS replacement syntax into the regex crate's.
fn translate_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('&') => {
                chars.next();
                out.push_str("${0}");
            }
            Some('$') => {
                chars.next();
                out.push_str("$$");
            }
            Some(d) if d.is_ascii_digit() => {
                let mut group = String::new();
                while let Some(d) = chars.peek().copied().filter(|d| d.is_ascii_digit()) {
                    if group.len() == 2 {
                        break;
                    }
                    group.push(d);
                    chars.next();
                }
                out.push_str(&format!("${{{}}}", group));
            }
            Some('<') => {
                chars.next();
                let name: String = chars.by_ref().take_while(|c| *c != '>').collect();
                out.push_str(&format!("${{{}}}", name));
            }
            _ => out.push_str("$$"),
        }
    }
    out
}

/// Applies one script to a text.
///
/// Disabled scripts and invalid patterns leave the text unchanged; invalid
/// patterns are logged.
///
/// # Examples
///
/// ```
/// use scrivener_automation::apply_regex_to_text;
/// use scrivener_core::RegexScript;
///
/// let script = RegexScript::new("quotes", "/\"(.+?)\"/g", "「$1」", 2);
/// assert_eq!(apply_regex_to_text("\"Hi\" and \"bye\"", &script), "「Hi」 and 「bye」");
/// ```
pub fn apply_regex_to_text(text: &str, script: &RegexScript) -> String {
    if *script.disabled() || script.find_regex().is_empty() {
        return text.to_string();
    }

    let pattern = match CompiledPattern::compile(script.find_regex()) {
        Ok(pattern) => pattern,
        Err(e) => {
            warn!(
                script = script.script_name().as_str(),
                error = %e,
                "Skipping regex script with invalid pattern"
            );
            return text.to_string();
        }
    };

    let mut result = pattern.replace(text, script.replace_string());
    for trim in script.trim_strings().iter().filter(|t| !t.is_empty()) {
        result = result.replace(trim.as_str(), "");
    }
    result
}

/// Applies every enabled script for `placement`, in order.
///
/// Yields to the runtime whenever more than ~50 ms of work has accumulated
/// so that slow patterns on long texts do not starve other tasks.
pub async fn process_text_with_regex(text: &str, scripts: &[RegexScript], placement: u8) -> String {
    let mut result = text.to_string();
    let mut since_yield = Instant::now();

    for script in scripts.iter().filter(|s| s.applies_to(placement)) {
        result = apply_regex_to_text(&result, script);

        if since_yield.elapsed() >= YIELD_BUDGET {
            debug!(script = script.script_name().as_str(), "Yielding during regex processing");
            tokio::task::yield_now().await;
            since_yield = Instant::now();
        }
    }
    result
}
