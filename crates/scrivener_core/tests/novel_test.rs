//! Tests for the novel aggregate and its serde shape.

use scrivener_core::{
    Chapter, ChapterSubtype, Novel, OutlineItem, OutlineSet, PLACEMENT_AI_OUTPUT,
    PLACEMENT_USER_INPUT, PromptItem, RegexScript, Role, SummaryRange,
};

#[test]
fn test_chapter_deserializes_camel_case_fields() {
    let json = r#"{
        "id": 4,
        "title": "Summary",
        "content": "They fought.",
        "volumeId": "v1",
        "subtype": "big_summary",
        "summaryRange": {"start": 1, "end": 3}
    }"#;

    let chapter: Chapter = serde_json::from_str(json).expect("valid chapter");

    assert_eq!(*chapter.id(), 4);
    assert_eq!(chapter.volume_id().as_deref(), Some("v1"));
    assert_eq!(chapter.effective_subtype(), ChapterSubtype::BigSummary);
    assert_eq!(*chapter.summary_range(), Some(SummaryRange::new(1, 3)));
    assert!(!chapter.is_story());
}

#[test]
fn test_chapter_without_subtype_is_story() {
    let chapter: Chapter = serde_json::from_str(r#"{"id": 1, "title": "One"}"#).expect("valid");

    assert!(chapter.is_story());
    assert!(!chapter.is_written());
}

#[test]
fn test_whitespace_content_is_not_written() {
    let mut chapter = Chapter::new(1, "One");
    chapter.set_content("   \n");
    assert!(!chapter.is_written());

    chapter.set_content("Text");
    assert!(chapter.is_written());
}

#[test]
fn test_next_chapter_id_uses_max() {
    let mut novel = Novel::new("n1", "Test");
    assert_eq!(novel.next_chapter_id(), 1);

    novel.push_chapter(Chapter::new(7, "Seven"));
    novel.push_chapter(Chapter::new(3, "Three"));

    assert_eq!(novel.next_chapter_id(), 8);
}

#[test]
fn test_novel_lookup_helpers() {
    let novel = Novel::builder()
        .id("n1")
        .chapters(vec![Chapter::new(1, "One"), Chapter::new(2, "Two")])
        .outline_sets(vec![OutlineSet::new(
            "o1",
            "Main",
            vec![OutlineItem::new("One", "Start")],
        )])
        .build()
        .expect("valid novel");

    assert_eq!(novel.chapter_by_title("Two").map(|c| *c.id()), Some(2));
    assert!(novel.chapter(3).is_none());
    assert_eq!(novel.outline_set("o1").map(|s| s.items().len()), Some(1));
    assert_eq!(novel.story_chapter_count(), 2);
}

#[test]
fn test_script_placement_bits() {
    let both = RegexScript::new("both", "a", "b", PLACEMENT_USER_INPUT | PLACEMENT_AI_OUTPUT);
    assert!(both.applies_to(PLACEMENT_USER_INPUT));
    assert!(both.applies_to(PLACEMENT_AI_OUTPUT));

    let disabled = RegexScript::builder()
        .find_regex("a")
        .placement(PLACEMENT_AI_OUTPUT)
        .disabled(true)
        .build()
        .expect("valid script");
    assert!(!disabled.applies_to(PLACEMENT_AI_OUTPUT));
}

#[test]
fn test_prompt_item_defaults_enabled() {
    let item: PromptItem =
        serde_json::from_str(r#"{"role": "system", "content": "Be terse."}"#).expect("valid");

    assert!(*item.enabled());
    assert_eq!(*item.to_message().role(), Role::System);
}
