//! The canvas document model: placed stickers plus background reference.

use serde::{Deserialize, Serialize};

use crate::{CanvasResult, Sticker, StickerId, MIN_STICKER_SIZE};

/// A canvas document: an ordered sequence of stickers (insertion order is
/// the paint/z-order, later on top) and an optional background URL.
///
/// Sticker ids are unique within a canvas and allocated monotonically.
/// Mutations addressed at an absent id are silent no-ops, so a stale id
/// held across a delete never causes a failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Canvas {
    stickers: Vec<Sticker>,
    #[serde(rename = "backgroundURL")]
    background_url: Option<String>,
    /// Next id to allocate. Not part of the wire format; rebuilt on decode.
    #[serde(skip)]
    next_id: u64,
}

impl PartialEq for Canvas {
    /// Value equality: stickers (including order) and background URL.
    /// The id allocator is bookkeeping, not document content.
    fn eq(&self, other: &Self) -> bool {
        self.stickers == other.stickers && self.background_url == other.background_url
    }
}

impl Eq for Canvas {}

impl Canvas {
    /// Create a fresh empty canvas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new sticker with a freshly allocated id.
    ///
    /// `size` is clamped to [`MIN_STICKER_SIZE`]. Always succeeds; returns
    /// the new sticker's id.
    pub fn add_sticker(&mut self, text: impl Into<String>, x: i32, y: i32, size: i32) -> StickerId {
        self.next_id += 1;
        let id = StickerId::from_raw(self.next_id);
        self.stickers.push(Sticker {
            id,
            text: text.into(),
            x,
            y,
            size: size.max(MIN_STICKER_SIZE),
        });
        id
    }

    /// Move a sticker by integer deltas. No-op if the id is absent.
    pub fn move_sticker(&mut self, id: StickerId, dx: i32, dy: i32) {
        if let Some(sticker) = self.sticker_mut(id) {
            sticker.x = sticker.x.saturating_add(dx);
            sticker.y = sticker.y.saturating_add(dy);
        }
    }

    /// Multiply a sticker's size by `factor`, rounding half-to-even and
    /// clamping to [`MIN_STICKER_SIZE`]. No-op if the id is absent.
    #[allow(clippy::cast_possible_truncation)]
    pub fn scale_sticker(&mut self, id: StickerId, factor: f32) {
        if let Some(sticker) = self.sticker_mut(id) {
            let scaled = (f64::from(sticker.size) * f64::from(factor)).round_ties_even();
            sticker.size = (scaled as i32).max(MIN_STICKER_SIZE);
        }
    }

    /// Remove the sticker with the given id.
    ///
    /// Returns whether a sticker was removed; an absent id is a no-op.
    pub fn delete_sticker(&mut self, id: StickerId) -> bool {
        let before = self.stickers.len();
        self.stickers.retain(|s| s.id != id);
        self.stickers.len() != before
    }

    /// Replace the background reference.
    ///
    /// The URL is stored as given; redirector unwrapping is the caller's
    /// concern (see [`crate::UrlPolicy`]).
    pub fn set_background_url(&mut self, url: Option<String>) {
        self.background_url = url;
    }

    /// The current background URL, if any.
    #[must_use]
    pub fn background_url(&self) -> Option<&str> {
        self.background_url.as_deref()
    }

    /// All stickers in paint order (first = bottom).
    #[must_use]
    pub fn stickers(&self) -> &[Sticker] {
        &self.stickers
    }

    /// Look up a sticker by id.
    #[must_use]
    pub fn sticker(&self, id: StickerId) -> Option<&Sticker> {
        self.stickers.iter().find(|s| s.id == id)
    }

    fn sticker_mut(&mut self, id: StickerId) -> Option<&mut Sticker> {
        self.stickers.iter_mut().find(|s| s.id == id)
    }

    /// Number of stickers on the canvas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stickers.len()
    }

    /// Check if the canvas has no stickers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty()
    }

    /// Serialize the canvas to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a canvas from JSON.
    ///
    /// Lenient by contract: empty or malformed input yields a fresh empty
    /// canvas instead of an error. Well-formed input round trips exactly.
    #[must_use]
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Self>(json) {
            Ok(mut canvas) => {
                // Id uniqueness is a document invariant; a payload that
                // repeats an id is as malformed as bad JSON.
                let mut seen = std::collections::HashSet::new();
                if !canvas.stickers.iter().all(|s| seen.insert(s.id)) {
                    tracing::debug!("Ignoring canvas document with duplicate sticker ids");
                    return Self::new();
                }
                for sticker in &mut canvas.stickers {
                    sticker.size = sticker.size.max(MIN_STICKER_SIZE);
                }
                // The allocator is not on the wire; resume past the highest
                // decoded id so future ids stay unique.
                canvas.next_id = canvas
                    .stickers
                    .iter()
                    .map(|s| s.id.raw())
                    .max()
                    .unwrap_or(0);
                canvas
            }
            Err(e) => {
                tracing::debug!("Ignoring malformed canvas document: {e}");
                Self::new()
            }
        }
    }
}
