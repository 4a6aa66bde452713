//! The document lifecycle controller.
//!
//! One [`Document`] per open canvas. Every mutation is funneled through
//! it: the controller applies the change, immediately persists the
//! serialized canvas (fire and forget), and keeps the background-image
//! fetch in sync with the current background URL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use emojiart_core::{
    fit_zoom, Canvas, DragOutcome, PaletteStore, PinchOutcome, Sticker, StickerId,
    TransformEngine, UrlPolicy, Vec2, ViewState,
};
use tokio::task::JoinHandle;
use url::Url;

use crate::fetch::{BackgroundFetcher, BackgroundImage};
use crate::store::DocumentStore;

/// Shared slot the fetch task publishes into.
type BackgroundSlot = Arc<RwLock<Option<BackgroundImage>>>;

/// Controller owning one canvas, its steady-state pan/zoom, the
/// selection/transform engine, and the palette registry.
///
/// All mutation entry points go through `&mut self`, so the document has
/// a single logical owner and needs no internal locking. The background
/// fetch is the only asynchronous piece: superseded fetches are aborted
/// and additionally fenced by a generation token so a raced completion
/// never publishes a stale image.
pub struct Document {
    key: String,
    canvas: Canvas,
    view: ViewState,
    engine: TransformEngine,
    palettes: PaletteStore,
    policy: UrlPolicy,
    store: Arc<dyn DocumentStore>,
    fetcher: Arc<dyn BackgroundFetcher>,
    background: BackgroundSlot,
    fetch_generation: Arc<AtomicU64>,
    fetch_handle: Option<JoinHandle<()>>,
}

impl Document {
    /// Open (or create) the document stored under `key`.
    ///
    /// Stored bytes are decoded leniently - absent or malformed data
    /// yields an empty canvas - and the initial background fetch starts
    /// if the stored document carries a URL. Must be called within a
    /// tokio runtime when a background URL is present.
    #[must_use]
    pub fn open(
        key: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        fetcher: Arc<dyn BackgroundFetcher>,
    ) -> Self {
        let key = key.into();
        let canvas = store
            .get(&key)
            .map(|bytes| Canvas::from_json(&String::from_utf8_lossy(&bytes)))
            .unwrap_or_default();
        let mut document = Self {
            key,
            canvas,
            view: ViewState::default(),
            engine: TransformEngine::new(),
            palettes: PaletteStore::new(),
            policy: UrlPolicy::default(),
            store,
            fetcher,
            background: Arc::new(RwLock::new(None)),
            fetch_generation: Arc::new(AtomicU64::new(0)),
            fetch_handle: None,
        };
        document.refetch_background();
        document
    }

    /// Replace the URL normalization policy.
    #[must_use]
    pub fn with_policy(mut self, policy: UrlPolicy) -> Self {
        self.policy = policy;
        self
    }

    // -----------------------------------------------------------------------
    // Canvas mutations (each one autosaves)
    // -----------------------------------------------------------------------

    /// Place a new sticker, returning its id.
    pub fn add_sticker(&mut self, text: impl Into<String>, x: i32, y: i32, size: i32) -> StickerId {
        let id = self.canvas.add_sticker(text, x, y, size);
        self.autosave();
        id
    }

    /// Move a sticker by integer deltas; no-op on a stale id.
    pub fn move_sticker(&mut self, id: StickerId, dx: i32, dy: i32) {
        self.canvas.move_sticker(id, dx, dy);
        self.autosave();
    }

    /// Scale a sticker's size; no-op on a stale id.
    pub fn scale_sticker(&mut self, id: StickerId, factor: f32) {
        self.canvas.scale_sticker(id, factor);
        self.autosave();
    }

    /// Delete a sticker and prune it from the selection.
    pub fn delete_sticker(&mut self, id: StickerId) {
        if self.canvas.delete_sticker(id) {
            self.engine.deselect(id);
            self.autosave();
        }
    }

    /// Set (or clear) the background URL.
    ///
    /// The raw string is normalized through the document's [`UrlPolicy`]
    /// before being stored; the background fetch restarts either way.
    pub fn set_background_url(&mut self, raw: Option<&str>) {
        let normalized = raw.map(|r| self.policy.normalize(r));
        self.canvas.set_background_url(normalized);
        self.autosave();
        self.refetch_background();
    }

    /// Replace the canvas with a fresh empty one.
    pub fn new_document(&mut self) {
        self.canvas = Canvas::new();
        self.engine.clear_selection();
        self.autosave();
        self.refetch_background();
    }

    // -----------------------------------------------------------------------
    // Gesture funnels
    // -----------------------------------------------------------------------

    /// A completed single tap on a sticker toggles its selection.
    pub fn tap(&mut self, id: StickerId) {
        self.engine.tap(id);
    }

    /// A tap on the empty canvas clears the selection.
    pub fn tap_background(&mut self) {
        self.engine.tap_background();
    }

    /// A completed long-press deletes the sticker regardless of
    /// selection state.
    pub fn long_press(&mut self, id: StickerId) {
        self.delete_sticker(id);
    }

    /// Update the live pinch factor.
    pub fn update_pinch(&mut self, factor: f32) {
        self.engine.update_pinch(factor);
    }

    /// Complete a pinch: zoom the canvas when nothing is selected,
    /// otherwise scale every selected sticker by the final factor.
    pub fn end_pinch(&mut self, factor: f32) {
        match self.engine.end_pinch(factor) {
            PinchOutcome::ZoomCanvas(f) => self.view.zoom *= f,
            PinchOutcome::ScaleSelection(ids, f) => {
                for id in ids {
                    self.canvas.scale_sticker(id, f);
                }
                self.autosave();
            }
        }
    }

    /// Update the live whole-canvas pan from a screen-space translation.
    pub fn update_pan(&mut self, screen_translation: Vec2) {
        self.engine.update_pan(screen_translation, &self.view);
    }

    /// Complete a whole-canvas pan, folding it into steady state.
    pub fn end_pan(&mut self, screen_translation: Vec2) {
        let delta = self.engine.end_pan(screen_translation, &self.view);
        self.view.pan += delta;
    }

    /// Start dragging a sticker.
    pub fn begin_drag(&mut self, id: StickerId) {
        self.engine.begin_drag(id);
    }

    /// Update the live drag from a screen-space translation.
    pub fn update_drag(&mut self, screen_translation: Vec2) {
        self.engine.update_drag(screen_translation, &self.view);
    }

    /// Complete a drag, moving the dragged sticker - or the whole
    /// selection when the dragged sticker was selected - by the final
    /// offset.
    pub fn end_drag(&mut self, screen_translation: Vec2) {
        let Some(DragOutcome { targets, dx, dy }) =
            self.engine.end_drag(screen_translation, &self.view)
        else {
            return;
        };
        for id in targets {
            self.canvas.move_sticker(id, dx, dy);
        }
        self.autosave();
    }

    /// Reset pan and fit the published background image into `viewport`.
    ///
    /// No-op without a decoded background image or with a degenerate
    /// viewport or image size.
    pub fn fit_to_view(&mut self, viewport: Vec2) {
        let Some(image_size) = self.background_size() else {
            return;
        };
        let Some(zoom) = fit_zoom(image_size, viewport) else {
            return;
        };
        self.view.pan = Vec2::ZERO;
        self.view.zoom = zoom;
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// Stickers in paint order.
    #[must_use]
    pub fn stickers(&self) -> &[Sticker] {
        self.canvas.stickers()
    }

    /// Look up one sticker.
    #[must_use]
    pub fn sticker(&self, id: StickerId) -> Option<&Sticker> {
        self.canvas.sticker(id)
    }

    /// The stored (normalized) background URL.
    #[must_use]
    pub fn background_url(&self) -> Option<&str> {
        self.canvas.background_url()
    }

    /// Steady-state pan/zoom.
    #[must_use]
    pub fn view(&self) -> ViewState {
        self.view
    }

    /// The selection/transform engine (selection set, live gesture reads).
    #[must_use]
    pub fn engine(&self) -> &TransformEngine {
        &self.engine
    }

    /// Screen position of a sticker for the given viewport size.
    #[must_use]
    pub fn screen_position(&self, id: StickerId, viewport: Vec2) -> Option<Vec2> {
        self.canvas
            .sticker(id)
            .map(|s| self.engine.screen_position(s, &self.view, viewport))
    }

    /// The published background image, if a fetch has completed.
    #[must_use]
    pub fn background_image(&self) -> Option<BackgroundImage> {
        self.background
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Natural size of the published background image.
    #[must_use]
    pub fn background_size(&self) -> Option<Vec2> {
        self.background
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(BackgroundImage::size)
    }

    /// Palette registry (read).
    #[must_use]
    pub fn palettes(&self) -> &PaletteStore {
        &self.palettes
    }

    /// Palette registry (edit: rename, cycle targets, add/remove emoji).
    pub fn palettes_mut(&mut self) -> &mut PaletteStore {
        &mut self.palettes
    }

    /// Wait for any in-flight background fetch to settle.
    ///
    /// Useful in tests and at shutdown; the published image is readable
    /// through [`Self::background_image`] afterwards.
    pub async fn await_background_fetch(&mut self) {
        if let Some(handle) = self.fetch_handle.take() {
            // An aborted or panicked task is already accounted for.
            let _ = handle.await;
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Serialize and persist the canvas. Fire and forget: failures are
    /// logged, never surfaced to the mutation that triggered the save.
    fn autosave(&self) {
        match self.canvas.to_json() {
            Ok(json) => self.store.set(&self.key, json.as_bytes()),
            Err(e) => tracing::warn!("Failed to serialize document {}: {e}", self.key),
        }
    }

    /// Restart the background fetch for the current URL.
    ///
    /// The published image is cleared up front so a failed, cancelled,
    /// or superseded fetch leaves "no background" rather than a stale
    /// image. The spawned task publishes only if its generation token is
    /// still the latest.
    fn refetch_background(&mut self) {
        let generation = self.fetch_generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(handle) = self.fetch_handle.take() {
            handle.abort();
        }
        *self
            .background
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;

        let Some(raw) = self.canvas.background_url() else {
            return;
        };
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Background URL {raw:?} is not fetchable: {e}");
                return;
            }
        };

        let fetcher = Arc::clone(&self.fetcher);
        let slot = Arc::clone(&self.background);
        let latest = Arc::clone(&self.fetch_generation);
        self.fetch_handle = Some(tokio::spawn(async move {
            let result = fetcher
                .fetch(&url)
                .await
                .and_then(|bytes| BackgroundImage::decode(&bytes));
            // Publish while holding the slot lock. A newer fetch bumps
            // the generation before it clears the slot (under this same
            // lock), so checking the token inside the critical section
            // leaves no window for a superseded image to land.
            let mut slot = slot.write().unwrap_or_else(PoisonError::into_inner);
            if latest.load(Ordering::SeqCst) != generation {
                tracing::debug!("Dropping superseded background fetch for {url}");
                return;
            }
            match result {
                Ok(decoded) => {
                    tracing::debug!(
                        "Background ready: {url} ({}x{})",
                        decoded.width,
                        decoded.height
                    );
                    *slot = Some(decoded);
                }
                Err(e) => tracing::warn!("Background fetch for {url} failed: {e}"),
            }
        }));
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        if let Some(handle) = self.fetch_handle.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("key", &self.key)
            .field("stickers", &self.canvas.len())
            .field("background_url", &self.canvas.background_url())
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}
