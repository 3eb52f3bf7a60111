//! Reference sets: worldview, characters and outlines.

use serde::{Deserialize, Serialize};

/// One worldview entry.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct WorldEntry {
    /// Name of the thing being described
    item: String,
    /// Its description
    setting: String,
}

impl WorldEntry {
    /// Creates an entry.
    pub fn new(item: impl Into<String>, setting: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            setting: setting.into(),
        }
    }
}

/// A named collection of worldview entries.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_getters::Getters,
)]
#[serde(rename_all = "camelCase")]
pub struct WorldviewSet {
    /// Set identifier
    id: String,
    /// Set name; sets belonging to one project share it
    name: String,
    /// Entries
    #[serde(default)]
    entries: Vec<WorldEntry>,
}

impl WorldviewSet {
    /// Creates a set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, entries: Vec<WorldEntry>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entries,
        }
    }
}

/// One character profile.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct CharacterProfile {
    /// Character name
    name: String,
    /// Biography
    bio: String,
}

impl CharacterProfile {
    /// Creates a profile.
    pub fn new(name: impl Into<String>, bio: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bio: bio.into(),
        }
    }
}

/// A named collection of character profiles.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_getters::Getters,
)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSet {
    /// Set identifier
    id: String,
    /// Set name
    name: String,
    /// Characters
    #[serde(default)]
    characters: Vec<CharacterProfile>,
}

impl CharacterSet {
    /// Creates a set.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        characters: Vec<CharacterProfile>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            characters,
        }
    }
}

/// One planned chapter in an outline.
///
/// # Examples
///
/// ```
/// use scrivener_core::OutlineItem;
///
/// let item = OutlineItem::new("Chapter 1", "The hero leaves home.");
/// assert_eq!(item.title(), "Chapter 1");
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct OutlineItem {
    /// Chapter title
    title: String,
    /// What happens in the chapter
    #[serde(default)]
    summary: String,
}

impl OutlineItem {
    /// Creates an outline item.
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
        }
    }
}

/// A named chapter outline.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_getters::Getters,
)]
#[serde(rename_all = "camelCase")]
pub struct OutlineSet {
    /// Set identifier
    id: String,
    /// Set name
    name: String,
    /// Outline items in order
    #[serde(default)]
    items: Vec<OutlineItem>,
}

impl OutlineSet {
    /// Creates an outline set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, items: Vec<OutlineItem>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            items,
        }
    }
}
