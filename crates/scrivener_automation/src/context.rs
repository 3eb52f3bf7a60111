//! Builds the reference and prior-chapter context for generation prompts.

use crate::{ContextConfig, ContextScope};
use scrivener_core::{Chapter, ChapterSubtype, Novel};
use std::collections::HashSet;
use tracing::debug;

/// Renders the worldview and character sets relevant to `active_set_id`.
///
/// A set is relevant when its id equals `active_set_id`, or when its name
/// equals the name of whichever set that id refers to (projects keep their
/// worldview and character sets under one shared name). Without an id the
/// first set of each kind is used.
///
/// # Examples
///
/// ```
/// use scrivener_automation::build_world_info_context;
/// use scrivener_core::{Novel, WorldEntry, WorldviewSet};
///
/// let novel = Novel::builder()
///     .worldview_sets(vec![WorldviewSet::new("w1", "Tides", vec![
///         WorldEntry::new("Moon", "Two moons pull the sea."),
///     ])])
///     .build()
///     .unwrap();
///
/// let context = build_world_info_context(&novel, None);
/// assert!(context.contains("- Moon: Two moons pull the sea."));
/// ```
pub fn build_world_info_context(novel: &Novel, active_set_id: Option<&str>) -> String {
    let worldview_sets = novel.worldview_sets();
    let character_sets = novel.character_sets();

    let (worldviews, characters): (Vec<_>, Vec<_>) = match active_set_id {
        Some(id) => {
            let name = worldview_sets
                .iter()
                .find(|s| s.id() == id)
                .map(|s| s.name().as_str())
                .or_else(|| {
                    character_sets
                        .iter()
                        .find(|s| s.id() == id)
                        .map(|s| s.name().as_str())
                });
            let matches = |set_id: &str, set_name: &str| set_id == id || Some(set_name) == name;

            (
                worldview_sets
                    .iter()
                    .filter(|s| matches(s.id(), s.name()))
                    .collect(),
                character_sets
                    .iter()
                    .filter(|s| matches(s.id(), s.name()))
                    .collect(),
            )
        }
        None => (
            worldview_sets.iter().take(1).collect(),
            character_sets.iter().take(1).collect(),
        ),
    };

    let mut sections = Vec::new();

    let world_lines: Vec<String> = worldviews
        .iter()
        .flat_map(|s| s.entries())
        .map(|e| format!("- {}: {}", e.item(), e.setting()))
        .collect();
    if !world_lines.is_empty() {
        sections.push(format!("World setting:\n{}", world_lines.join("\n")));
    }

    let character_lines: Vec<String> = characters
        .iter()
        .flat_map(|s| s.characters())
        .map(|c| format!("- {}: {}", c.name(), c.bio()))
        .collect();
    if !character_lines.is_empty() {
        sections.push(format!("Characters:\n{}", character_lines.join("\n")));
    }

    sections.join("\n\n")
}

/// Chapters sharing the target's scope, in novel order.
fn scope_chapters<'a>(novel: &'a Novel, target: &Chapter, scope: ContextScope) -> Vec<&'a Chapter> {
    novel
        .chapters()
        .iter()
        .filter(|c| match scope {
            ContextScope::All => true,
            ContextScope::CurrentVolume => c.volume_id() == target.volume_id(),
        })
        .collect()
}

/// 1-based position of the target among the story chapters of its scope.
///
/// A target missing from the novel is numbered after the last story chapter.
pub fn chapter_number(novel: &Novel, target: &Chapter, scope: ContextScope) -> usize {
    let stories: Vec<&Chapter> = scope_chapters(novel, target, scope)
        .into_iter()
        .filter(|c| c.is_story())
        .collect();

    stories
        .iter()
        .position(|c| c.id() == target.id())
        .unwrap_or(stories.len())
        + 1
}

fn render_chapter(chapter: &Chapter) -> String {
    format!("### {}\n{}", chapter.title(), chapter.content().trim())
}

fn summary_label(subtype: ChapterSubtype) -> &'static str {
    match subtype {
        ChapterSubtype::BigSummary => "Big summary",
        _ => "Summary",
    }
}

/// Computes the narrative context to place before a new chapter.
///
/// Without long-text mode this is every earlier story chapter of the
/// target's volume. In long-text mode older chapters are represented by
/// summary chapters, and at least `context_chapter_count` chapters before
/// the end of the last summary are still included verbatim.
pub fn get_chapter_context(novel: &Novel, target: &Chapter, config: &ContextConfig) -> String {
    if !config.long_text_mode {
        let volume_chapters = scope_chapters(novel, target, ContextScope::CurrentVolume);
        let prior: Vec<String> = volume_chapters
            .iter()
            .filter(|c| c.is_story())
            .take_while(|c| c.id() != target.id())
            .filter(|c| c.is_written())
            .map(|c| render_chapter(c))
            .collect();
        return prior.join("\n\n");
    }

    let scope = config.context_scope;
    let target_number = chapter_number(novel, target, scope);
    let in_scope = scope_chapters(novel, target, scope);

    let mut summaries: Vec<(&Chapter, usize, usize)> = in_scope
        .iter()
        .filter(|c| !c.is_story())
        .filter_map(|c| c.summary_range().map(|r| (*c, r.start, r.end)))
        .filter(|(_, _, end)| *end < target_number)
        .collect();
    summaries.sort_by_key(|(_, start, end)| (*start, *end));

    let max_summarized_end = summaries.iter().map(|(_, _, end)| *end).max().unwrap_or(0);
    let story_start = (max_summarized_end + 1)
        .saturating_sub(config.context_chapter_count)
        .max(1);

    debug!(
        target_number,
        summaries = summaries.len(),
        max_summarized_end,
        story_start,
        "Assembling long-text context"
    );

    let mut sections: Vec<String> = summaries
        .iter()
        .map(|(chapter, start, end)| {
            format!(
                "[{}: chapters {}-{}]\n{}",
                summary_label(chapter.effective_subtype()),
                start,
                end,
                chapter.content().trim()
            )
        })
        .collect();

    let mut seen = HashSet::new();
    let recent = in_scope
        .iter()
        .filter(|c| c.is_story())
        .enumerate()
        .map(|(i, c)| (i + 1, c))
        .filter(|(number, _)| *number >= story_start && *number < target_number)
        .filter(|(_, c)| c.is_written() && seen.insert(*c.id()))
        .map(|(_, c)| render_chapter(c));
    sections.extend(recent);

    sections.join("\n\n")
}
