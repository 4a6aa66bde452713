//! Named, ordered palettes of candidate stickers.
//!
//! A [`PaletteStore`] maps stable keys to emoji strings with optional
//! human names. Keys keep insertion order, which is also the cyclic
//! navigation order for next/previous. The default entry is always
//! present; operations on unknown keys create them rather than failing.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Key of the built-in palette every store starts with.
pub const DEFAULT_PALETTE_KEY: &str = "default";

/// Contents of the built-in palette.
const DEFAULT_PALETTE_EMOJIS: &str = "🍎🍏🍅🍆🥒🥬🥦🧄🫑🧀🥨";

/// A single palette: identity key, optional display name, emoji contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Stable identity key (also the cyclic-order key).
    pub key: String,
    /// Human-readable name, if one has been set.
    pub name: Option<String>,
    /// Ordered emoji contents, one grapheme per candidate sticker.
    pub emojis: String,
}

/// Ordered registry of palettes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteStore {
    palettes: Vec<Palette>,
}

impl Default for PaletteStore {
    fn default() -> Self {
        Self {
            palettes: vec![Palette {
                key: DEFAULT_PALETTE_KEY.to_string(),
                name: Some("Default".to_string()),
                emojis: DEFAULT_PALETTE_EMOJIS.to_string(),
            }],
        }
    }
}

impl PaletteStore {
    /// Create a store holding only the default palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys in stable (insertion) order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.palettes.iter().map(|p| p.key.as_str())
    }

    /// All palettes in key order.
    #[must_use]
    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    /// Emoji contents of a palette, if the key exists.
    #[must_use]
    pub fn content(&self, key: &str) -> Option<&str> {
        self.palettes
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.emojis.as_str())
    }

    /// The human name for a key, or the key itself if unnamed or unknown.
    #[must_use]
    pub fn name_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.palettes
            .iter()
            .find(|p| p.key == key)
            .and_then(|p| p.name.as_deref())
            .unwrap_or(key)
    }

    /// Cyclic successor of `key` in the stable key order.
    ///
    /// An unknown key falls back to the first key.
    #[must_use]
    pub fn next(&self, key: &str) -> &str {
        self.step(key, 1)
    }

    /// Cyclic predecessor of `key` in the stable key order.
    ///
    /// An unknown key falls back to the first key.
    #[must_use]
    pub fn previous(&self, key: &str) -> &str {
        self.step(key, self.palettes.len() - 1)
    }

    fn step(&self, key: &str, offset: usize) -> &str {
        // The store always holds at least the default entry.
        match self.palettes.iter().position(|p| p.key == key) {
            Some(i) => &self.palettes[(i + offset) % self.palettes.len()].key,
            None => &self.palettes[0].key,
        }
    }

    /// Set the human name of a palette, creating the key if needed.
    pub fn rename(&mut self, key: &str, new_name: impl Into<String>) {
        self.entry_mut(key).name = Some(new_name.into());
    }

    /// Replace a palette's contents, creating the key if needed.
    pub fn set_content(&mut self, key: &str, emojis: impl Into<String>) {
        self.entry_mut(key).emojis = emojis.into();
    }

    /// Append any grapheme clusters of `emojis` not already present,
    /// preserving existing order. Returns the (possibly newly created) key.
    ///
    /// Palette contents are compared cluster by cluster, so a multi-scalar
    /// emoji (ZWJ sequence, skin tone) neither splits apart nor shadows
    /// its constituent scalars.
    pub fn add_emoji(&mut self, emojis: &str, key: &str) -> String {
        let entry = self.entry_mut(key);
        for grapheme in emojis.graphemes(true) {
            if !entry.emojis.graphemes(true).any(|g| g == grapheme) {
                entry.emojis.push_str(grapheme);
            }
        }
        entry.key.clone()
    }

    /// Remove all occurrences of the grapheme cluster `emoji` from a
    /// palette's contents. Returns the (possibly newly created) key.
    pub fn remove_emoji(&mut self, emoji: &str, key: &str) -> String {
        let entry = self.entry_mut(key);
        entry.emojis = entry
            .emojis
            .graphemes(true)
            .filter(|g| *g != emoji)
            .collect();
        entry.key.clone()
    }

    /// Mutable access to a palette, creating an empty one for unknown keys.
    fn entry_mut(&mut self, key: &str) -> &mut Palette {
        let i = match self.palettes.iter().position(|p| p.key == key) {
            Some(i) => i,
            None => {
                self.palettes.push(Palette {
                    key: key.to_string(),
                    name: None,
                    emojis: String::new(),
                });
                self.palettes.len() - 1
            }
        };
        &mut self.palettes[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entry_present() {
        let store = PaletteStore::new();
        assert!(store.content(DEFAULT_PALETTE_KEY).is_some());
        assert_eq!(store.name_for(DEFAULT_PALETTE_KEY), "Default");
    }

    #[test]
    fn test_name_falls_back_to_key() {
        let mut store = PaletteStore::new();
        store.set_content("faces", "😀😅");
        assert_eq!(store.name_for("faces"), "faces");
        store.rename("faces", "Faces");
        assert_eq!(store.name_for("faces"), "Faces");
        assert_eq!(store.name_for("never-seen"), "never-seen");
    }

    #[test]
    fn test_cycle_next_then_previous_returns_home() {
        let mut store = PaletteStore::new();
        store.set_content("faces", "😀");
        store.set_content("animals", "🐈");

        for key in ["default", "faces", "animals"] {
            let there = store.next(key).to_string();
            assert_eq!(store.previous(&there), key);
        }
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        let mut store = PaletteStore::new();
        store.set_content("faces", "😀");
        store.set_content("animals", "🐈");

        let mut key = "faces".to_string();
        for _ in 0..store.palettes().len() {
            key = store.next(&key).to_string();
        }
        assert_eq!(key, "faces");
    }

    #[test]
    fn test_unknown_key_cycles_to_first() {
        let store = PaletteStore::new();
        assert_eq!(store.next("missing"), DEFAULT_PALETTE_KEY);
        assert_eq!(store.previous("missing"), DEFAULT_PALETTE_KEY);
    }

    #[test]
    fn test_add_emoji_skips_duplicates_preserves_order() {
        let mut store = PaletteStore::new();
        store.set_content("faces", "😀😅");
        let key = store.add_emoji("😅🤠😀🥸", "faces");
        assert_eq!(key, "faces");
        assert_eq!(store.content("faces"), Some("😀😅🤠🥸"));
    }

    #[test]
    fn test_add_emoji_creates_unknown_key() {
        let mut store = PaletteStore::new();
        let key = store.add_emoji("🚗🚕", "vehicles");
        assert_eq!(key, "vehicles");
        assert_eq!(store.content("vehicles"), Some("🚗🚕"));
    }

    #[test]
    fn test_remove_emoji_removes_all_occurrences() {
        let mut store = PaletteStore::new();
        store.set_content("faces", "😀😅😀🤠");
        store.remove_emoji("😀", "faces");
        assert_eq!(store.content("faces"), Some("😅🤠"));
    }

    #[test]
    fn test_remove_emoji_on_unknown_key_creates_empty() {
        let mut store = PaletteStore::new();
        let key = store.remove_emoji("😀", "brand-new");
        assert_eq!(key, "brand-new");
        assert_eq!(store.content("brand-new"), Some(""));
    }

    #[test]
    fn test_add_emoji_keeps_zwj_sequences_intact() {
        let mut store = PaletteStore::new();
        store.set_content("people", "");
        store.add_emoji("👨‍👩‍👧", "people");
        assert_eq!(store.content("people"), Some("👨‍👩‍👧"));

        // A constituent of the family sequence is still a distinct
        // candidate and must not be swallowed by the sequence.
        store.add_emoji("👩", "people");
        assert_eq!(store.content("people"), Some("👨‍👩‍👧👩"));

        // Re-adding the full sequence stays deduplicated.
        store.add_emoji("👨‍👩‍👧", "people");
        assert_eq!(store.content("people"), Some("👨‍👩‍👧👩"));
    }

    #[test]
    fn test_add_emoji_distinguishes_skin_tones() {
        let mut store = PaletteStore::new();
        store.set_content("hands", "👍");
        store.add_emoji("👍🏽", "hands");
        assert_eq!(store.content("hands"), Some("👍👍🏽"));
    }

    #[test]
    fn test_remove_emoji_takes_whole_cluster() {
        let mut store = PaletteStore::new();
        store.set_content("people", "👨‍👩‍👧👩🤠");
        store.remove_emoji("👨‍👩‍👧", "people");
        assert_eq!(store.content("people"), Some("👩🤠"));

        // Removing a constituent scalar leaves other clusters alone.
        store.remove_emoji("👩", "people");
        assert_eq!(store.content("people"), Some("🤠"));
    }
}
