//! The novel aggregate: chapters, volumes and reference sets.

use crate::{CharacterSet, OutlineSet, WorldviewSet};
use serde::{Deserialize, Serialize};

/// What kind of text a chapter holds.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ChapterSubtype {
    /// Narrative prose
    #[default]
    #[display("story")]
    Story,
    /// Summary of a handful of recent chapters
    #[display("small_summary")]
    SmallSummary,
    /// Summary of a long stretch of chapters
    #[display("big_summary")]
    BigSummary,
}

impl ChapterSubtype {
    /// Returns true for either summary kind.
    pub fn is_summary(self) -> bool {
        matches!(self, Self::SmallSummary | Self::BigSummary)
    }
}

/// Inclusive, 1-based range of story chapter numbers covered by a summary.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("{start}-{end}")]
pub struct SummaryRange {
    /// First chapter covered
    pub start: usize,
    /// Last chapter covered
    pub end: usize,
}

impl SummaryRange {
    /// Creates a range.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A chapter record.
///
/// # Examples
///
/// ```
/// use scrivener_core::{Chapter, ChapterSubtype};
///
/// let chapter = Chapter::new(1, "The Storm");
/// assert!(chapter.content().is_empty());
/// assert_eq!(chapter.effective_subtype(), ChapterSubtype::Story);
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
pub struct Chapter {
    /// Numeric identifier, unique within the novel
    id: u64,
    /// Chapter title, used to match outline items
    title: String,
    /// Chapter text
    #[serde(default)]
    content: String,
    /// Owning volume, if filed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    volume_id: Option<String>,
    /// Kind of chapter; absent means story
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subtype: Option<ChapterSubtype>,
    /// Chapters covered, for summary chapters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary_range: Option<SummaryRange>,
}

impl Chapter {
    /// Creates an empty, unfiled story chapter.
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    /// Returns a builder for constructing a Chapter.
    pub fn builder() -> ChapterBuilder {
        ChapterBuilder::default()
    }

    /// Subtype with the story default applied.
    pub fn effective_subtype(&self) -> ChapterSubtype {
        self.subtype.unwrap_or_default()
    }

    /// Returns true for story chapters.
    pub fn is_story(&self) -> bool {
        !self.effective_subtype().is_summary()
    }

    /// Returns true once the chapter holds any non-blank text.
    pub fn is_written(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Replaces the chapter text.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Files the chapter into a volume, or unfiles it.
    pub fn set_volume_id(&mut self, volume_id: Option<String>) {
        self.volume_id = volume_id;
    }

    /// Sets the chapter kind.
    pub fn set_subtype(&mut self, subtype: Option<ChapterSubtype>) {
        self.subtype = subtype;
    }
}

/// A volume groups chapters.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_getters::Getters,
)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Volume identifier
    id: String,
    /// Display title
    #[serde(default)]
    title: String,
}

impl Volume {
    /// Creates a volume.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// The novel aggregate.
///
/// The automation engines take a working copy, mutate it and hand the whole
/// value back to the caller; nothing here is shared.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into), default)]
pub struct Novel {
    /// Novel identifier
    #[serde(default)]
    id: String,
    /// Title
    #[serde(default)]
    title: String,
    /// Chapters in outline order
    #[serde(default)]
    chapters: Vec<Chapter>,
    /// Volumes
    #[serde(default)]
    volumes: Vec<Volume>,
    /// Worldview reference sets
    #[serde(default)]
    worldview_sets: Vec<WorldviewSet>,
    /// Character reference sets
    #[serde(default)]
    character_sets: Vec<CharacterSet>,
    /// Outline sets
    #[serde(default)]
    outline_sets: Vec<OutlineSet>,
}

impl Novel {
    /// Creates an empty novel.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Returns a builder for constructing a Novel.
    pub fn builder() -> NovelBuilder {
        NovelBuilder::default()
    }

    /// Mutable access to the chapter list.
    pub fn chapters_mut(&mut self) -> &mut Vec<Chapter> {
        &mut self.chapters
    }

    /// Finds a chapter by id.
    pub fn chapter(&self, id: u64) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Finds a chapter by id for mutation.
    pub fn chapter_mut(&mut self, id: u64) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find(|c| c.id == id)
    }

    /// Finds the first chapter with the given title.
    pub fn chapter_by_title(&self, title: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.title == title)
    }

    /// Next free chapter id.
    pub fn next_chapter_id(&self) -> u64 {
        self.chapters.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    /// Appends a chapter.
    pub fn push_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Finds an outline set by id.
    pub fn outline_set(&self, id: &str) -> Option<&OutlineSet> {
        self.outline_sets.iter().find(|s| s.id() == id)
    }

    /// Number of story chapters.
    pub fn story_chapter_count(&self) -> usize {
        self.chapters.iter().filter(|c| c.is_story()).count()
    }
}
