//! Splits one multi-chapter reply back into per-chapter texts.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Written into chapters the model did not deliver.
pub const MISSING_CHAPTER_PLACEHOLDER: &str =
    "[Generation failed: no content was returned for this chapter]";

static ANY_HEADING: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*###[^\n]*$").ok());

fn heading_pattern(title: &str) -> Option<Regex> {
    RegexBuilder::new(&format!(r"^[ \t]*###[ \t]*{}[ \t\r]*$", regex::escape(title.trim())))
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .ok()
}

/// Segments delimited by each expected heading, if all of them are present
/// in order.
fn split_by_titles(text: &str, titles: &[String]) -> Option<Vec<String>> {
    let mut bounds = Vec::with_capacity(titles.len());
    let mut cursor = 0;

    for title in titles {
        let found = heading_pattern(title)?.find_at(text, cursor)?;
        bounds.push((found.start(), found.end()));
        cursor = found.end();
    }

    let segments = bounds
        .iter()
        .enumerate()
        .map(|(i, (_, body_start))| {
            let body_end = bounds.get(i + 1).map_or(text.len(), |(next, _)| *next);
            text[*body_start..body_end].trim().to_string()
        })
        .collect();
    Some(segments)
}

/// Segments between any `###` headings, in order.
fn split_by_any_heading(text: &str) -> Vec<String> {
    let Some(heading) = ANY_HEADING.as_ref() else {
        return vec![text.trim().to_string()];
    };

    let headings: Vec<_> = heading.find_iter(text).collect();
    if headings.is_empty() {
        return vec![text.trim().to_string()];
    }

    headings
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let body_end = headings.get(i + 1).map_or(text.len(), |next| next.start());
            text[m.end()..body_end].trim().to_string()
        })
        .collect()
}

/// Drops a leading heading line from a single-chapter reply.
fn strip_leading_heading(text: &str) -> &str {
    let trimmed = text.trim_start();
    if trimmed.starts_with('#') {
        trimmed.split_once('\n').map_or("", |(_, rest)| rest)
    } else {
        trimmed
    }
}

/// Splits `text` into exactly `titles.len()` chapter bodies.
///
/// Headings that match the expected titles are preferred; otherwise any
/// `###` heading splits positionally. Missing or empty bodies become
/// [`MISSING_CHAPTER_PLACEHOLDER`], and surplus segments are folded into the
/// last chapter.
///
/// # Examples
///
/// ```
/// use scrivener_automation::split_batch_response;
///
/// let titles = vec!["Ch1".to_string(), "Ch2".to_string()];
/// let parts = split_batch_response("### Ch1\nText1\n### Ch2\nText2", &titles);
/// assert_eq!(parts, vec!["Text1", "Text2"]);
/// ```
pub fn split_batch_response(text: &str, titles: &[String]) -> Vec<String> {
    if titles.is_empty() {
        return Vec::new();
    }

    let mut segments = if titles.len() == 1 {
        vec![strip_leading_heading(text).trim().to_string()]
    } else if let Some(segments) = split_by_titles(text, titles) {
        debug!(chapters = titles.len(), "Split reply on expected headings");
        segments
    } else {
        let segments = split_by_any_heading(text);
        warn!(
            expected = titles.len(),
            found = segments.len(),
            "Expected headings missing, split reply positionally"
        );
        segments
    };

    if segments.len() > titles.len() {
        let surplus = segments.split_off(titles.len());
        if let Some(last) = segments.last_mut() {
            for extra in surplus.into_iter().filter(|s| !s.is_empty()) {
                last.push_str("\n\n");
                last.push_str(&extra);
            }
        }
    }
    segments.resize(titles.len(), String::new());

    segments
        .into_iter()
        .map(|s| {
            if s.is_empty() {
                MISSING_CHAPTER_PLACEHOLDER.to_string()
            } else {
                s
            }
        })
        .collect()
}
