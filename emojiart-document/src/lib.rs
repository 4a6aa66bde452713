//! # `EmojiArt` Document
//!
//! Document lifecycle controller over [`emojiart_core`]: owns one canvas
//! plus its steady-state pan/zoom, autosaves every mutation through a
//! pluggable [`store::DocumentStore`], and manages the cancellable
//! asynchronous background-image fetch.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod fetch;
pub mod store;

pub use document::Document;
pub use fetch::{BackgroundFetcher, BackgroundImage, FetchError, HttpFetcher};
pub use store::{DocumentStore, FileStore, MemoryStore};
