//! Action tags in realistic model replies.

use scrivener_automation::{Action, UiAction, clean_text, has_action, parse_actions};
use serde_json::json;

const REPLY: &str = r#"The world is ready. I'll move on to the outline next.
[ACTION:NAVIGATE]{"target": "outline"}[/ACTION]
[ACTION:START_AUTO_WRITE]{"outlineSetId": "o1", "startIndex": 2, "includeFullOutline": true}"#;

#[test]
fn test_reply_with_closed_and_trailing_tags() {
    let actions = parse_actions(REPLY);
    assert_eq!(actions.len(), 2);

    assert_eq!(
        actions[0].to_ui_action().unwrap(),
        UiAction::Navigate {
            target: "outline".to_string()
        }
    );
    assert_eq!(
        actions[1].to_ui_action().unwrap(),
        UiAction::StartAutoWrite {
            outline_set_id: Some("o1".to_string()),
            start_index: Some(2),
            target_volume_id: None,
            include_full_outline: true,
        }
    );

    assert_eq!(
        clean_text(REPLY),
        "The world is ready. I'll move on to the outline next."
    );
    assert!(has_action(REPLY, Some("START_AUTO_WRITE")));
    assert!(!has_action(REPLY, Some("GET_MANIFEST")));
}

#[test]
fn test_unclosed_tag_between_prose() {
    let text = r#"a[ACTION:FOO]{"x":1}[/ACTION]b[ACTION:BAR]{"y":2}c"#;

    assert_eq!(
        parse_actions(text),
        vec![
            Action::new("FOO", json!({"x": 1})),
            Action::new("BAR", json!({"y": 2})),
        ]
    );
    assert_eq!(clean_text(text), "abc");
}

#[test]
fn test_unknown_and_malformed_actions() {
    let unknown = Action::new("LAUNCH_ROCKET", json!({}));
    let err = unknown.to_ui_action().unwrap_err();
    assert_eq!(err.action_type, "LAUNCH_ROCKET");

    let missing_field = Action::new("NAVIGATE", json!({"page": "outline"}));
    assert!(missing_field.to_ui_action().is_err());

    let empty = Action::new("GET_MANIFEST", json!({}));
    assert_eq!(empty.to_ui_action().unwrap(), UiAction::GetManifest {});
}

#[test]
fn test_plain_text_has_no_actions() {
    let text = "Nothing to do here [ACTION] or [ACTION:] here.";
    assert!(parse_actions(text).is_empty());
    assert_eq!(clean_text(text), text);
}
