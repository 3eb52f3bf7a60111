//! Helpers for pulling JSON out of noisy model output.

/// Returns the first balanced `open ... close` span, honouring JSON strings.
///
/// # Examples
///
/// ```
/// use scrivener_automation::extract_balanced;
///
/// let text = r#"prefix {"a": {"b": "}"}} trailing"#;
/// assert_eq!(extract_balanced(text, '{', '}'), Some(r#"{"a": {"b": "}"}}"#));
/// ```
pub fn extract_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + i + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Removes Markdown code-fence markers (```` ``` ```` and ```` ```json ````).
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
}

/// Slices from the first `{` to the last `}` inclusive.
pub fn outer_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(extract_balanced(r#"{"a": 1"#, '{', '}'), None);
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"a": "x\"}"} tail"#;
        assert_eq!(extract_balanced(text, '{', '}'), Some(r#"{"a": "x\"}"}"#));
    }

    #[test]
    fn test_outer_span_needs_closing_after_opening() {
        assert_eq!(outer_object_span("} nothing {"), None);
        assert_eq!(outer_object_span("x {1} y {2} z"), Some("{1} y {2}"));
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_code_fences("```json\n{}\n```").trim(), "{}");
    }
}
