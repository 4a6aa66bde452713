//! # `EmojiArt` Core
//!
//! Document model and coordinate/selection engine for an emoji sticker
//! canvas editor. Pure data and geometry - no async runtime, no I/O.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               emojiart-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Canvas Model    │  Selection & Transform   │
//! │  - Stickers      │  - Selection set         │
//! │  - Background    │  - Pan/zoom steady state │
//! │  - JSON codec    │  - Drag/pinch gestures   │
//! ├─────────────────────────────────────────────┤
//! │  Palette Registry│  URL Policy              │
//! │  - Cyclic order  │  - Redirector unwrap     │
//! │  - Default entry │                          │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod canvas;
pub mod error;
pub mod geometry;
pub mod palette;
pub mod sticker;
pub mod urlnorm;
pub mod view;

pub use canvas::Canvas;
pub use error::{CanvasError, CanvasResult};
pub use geometry::Vec2;
pub use palette::{Palette, PaletteStore, DEFAULT_PALETTE_KEY};
pub use sticker::{Sticker, StickerId, MIN_STICKER_SIZE};
pub use urlnorm::UrlPolicy;
pub use view::{fit_zoom, DragOutcome, PinchOutcome, TransformEngine, ViewState};

/// Core crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
