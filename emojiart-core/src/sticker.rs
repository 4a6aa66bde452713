//! Stickers - the placed glyphs that make up a canvas.

use serde::{Deserialize, Serialize};

use crate::Vec2;

/// Smallest size a sticker can be scaled down to.
pub const MIN_STICKER_SIZE: i32 = 1;

/// Unique identifier for a sticker within one canvas.
///
/// Allocated monotonically by [`crate::Canvas`] and never reused for the
/// lifetime of a document. Identity is the id alone - two stickers may
/// share text, position, and size.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct StickerId(u64);

impl StickerId {
    /// Create an id from a raw value (used when decoding documents).
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StickerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A placed sticker: a text glyph with a position and size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    /// Unique identifier (the sole identity key).
    pub id: StickerId,
    /// Glyph content, typically a single emoji grapheme.
    pub text: String,
    /// Horizontal position relative to the document center.
    pub x: i32,
    /// Vertical position relative to the document center.
    pub y: i32,
    /// Font-size-equivalent, always >= [`MIN_STICKER_SIZE`].
    pub size: i32,
}

impl Sticker {
    /// The sticker's document-space location as a vector.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn location(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    /// The sticker's size as a rendering font size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn font_size(&self) -> f32 {
        self.size as f32
    }
}
