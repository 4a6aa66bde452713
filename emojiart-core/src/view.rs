//! Selection set and screen-space transforms under pan/zoom/drag.
//!
//! The engine owns the transient side of the editor: which stickers are
//! selected and what the in-flight gesture is doing. It reads the canvas
//! and the controller-owned steady-state [`ViewState`], never mutates
//! either; completed gestures are reported as outcomes for the controller
//! to apply.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Sticker, StickerId, Vec2};

/// Steady-state pan offset and zoom scale, persisted across gestures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Pan offset in document space (applied zoom-multiplied on screen).
    pub pan: Vec2,
    /// Zoom scale, always positive.
    pub zoom: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

/// What a completed pinch asks the controller to do.
#[derive(Debug, Clone, PartialEq)]
pub enum PinchOutcome {
    /// Selection was empty: fold the factor into steady-state zoom.
    ZoomCanvas(f32),
    /// Selection was non-empty: scale each selected sticker's size.
    ScaleSelection(Vec<StickerId>, f32),
}

/// What a completed drag asks the controller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragOutcome {
    /// Stickers to move: the whole selection if the dragged sticker was
    /// selected, otherwise just the dragged sticker.
    pub targets: Vec<StickerId>,
    /// Final horizontal offset in document space, rounded.
    pub dx: i32,
    /// Final vertical offset in document space, rounded.
    pub dy: i32,
}

/// In-flight drag on one sticker (the `Dragging` state).
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragGesture {
    target: StickerId,
    /// Zoom-divided translation so far.
    translation: Vec2,
}

/// Selection set plus live gesture state.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    selection: HashSet<StickerId>,
    /// Live pan translation, already zoom-divided. Neutral: zero.
    gesture_pan: Vec2,
    /// Live pinch factor. Neutral: 1.
    gesture_zoom: f32,
    /// Active drag, if any. Neutral: none (the `Idle` state).
    drag: Option<DragGesture>,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self {
            selection: HashSet::new(),
            gesture_pan: Vec2::ZERO,
            gesture_zoom: 1.0,
            drag: None,
        }
    }
}

impl TransformEngine {
    /// Create an engine with empty selection and neutral gestures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Ids currently selected.
    #[must_use]
    pub fn selection(&self) -> &HashSet<StickerId> {
        &self.selection
    }

    /// Whether a sticker is in the selection set.
    #[must_use]
    pub fn is_selected(&self, id: StickerId) -> bool {
        self.selection.contains(&id)
    }

    /// A completed single tap on a sticker toggles its membership,
    /// leaving every other sticker's membership alone.
    pub fn tap(&mut self, id: StickerId) {
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
    }

    /// A tap on empty canvas clears the selection.
    pub fn tap_background(&mut self) {
        self.selection.clear();
    }

    /// Drop one id from the selection (delete-time pruning).
    pub fn deselect(&mut self, id: StickerId) {
        self.selection.remove(&id);
    }

    /// Clear the selection set.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // -----------------------------------------------------------------------
    // Screen-space transforms
    // -----------------------------------------------------------------------

    /// Effective zoom: steady-state times the live pinch factor, except
    /// that a live pinch is redirected to per-sticker scaling while the
    /// selection is non-empty.
    #[must_use]
    pub fn zoom_scale(&self, view: &ViewState) -> f32 {
        if self.selection.is_empty() {
            view.zoom * self.gesture_zoom
        } else {
            view.zoom
        }
    }

    /// Effective screen-space pan: (steady pan + live pan) * zoom.
    #[must_use]
    pub fn pan_offset(&self, view: &ViewState) -> Vec2 {
        (view.pan + self.gesture_pan) * self.zoom_scale(view)
    }

    /// Screen position of a sticker for the given viewport size.
    ///
    /// Document coordinates are centered on (0,0); the live drag delta is
    /// added while the sticker participates in the active drag.
    #[must_use]
    pub fn screen_position(&self, sticker: &Sticker, view: &ViewState, viewport: Vec2) -> Vec2 {
        let zoom = self.zoom_scale(view);
        let mut position =
            sticker.location() * zoom + viewport * 0.5 + self.pan_offset(view);
        if self.participates_in_drag(sticker.id) {
            position += self.drag_offset(view);
        }
        position
    }

    /// Live drag delta in screen space.
    #[must_use]
    pub fn drag_offset(&self, view: &ViewState) -> Vec2 {
        self.drag
            .map_or(Vec2::ZERO, |d| d.translation * self.zoom_scale(view))
    }

    /// Whether a sticker previews the active drag: the dragged sticker
    /// itself, or the whole selection when the dragged sticker is selected.
    #[must_use]
    pub fn participates_in_drag(&self, id: StickerId) -> bool {
        match self.drag {
            Some(d) if d.target == id => true,
            Some(d) => self.is_selected(d.target) && self.is_selected(id),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Pinch
    // -----------------------------------------------------------------------

    /// Update the live pinch factor.
    pub fn update_pinch(&mut self, factor: f32) {
        self.gesture_zoom = factor;
    }

    /// Complete a pinch, resetting the live factor to neutral.
    pub fn end_pinch(&mut self, factor: f32) -> PinchOutcome {
        self.gesture_zoom = 1.0;
        if self.selection.is_empty() {
            tracing::debug!("Pinch ended: canvas zoom x{factor}");
            PinchOutcome::ZoomCanvas(factor)
        } else {
            let mut targets: Vec<_> = self.selection.iter().copied().collect();
            targets.sort_unstable();
            tracing::debug!("Pinch ended: scaling {} selected stickers", targets.len());
            PinchOutcome::ScaleSelection(targets, factor)
        }
    }

    // -----------------------------------------------------------------------
    // Pan (always whole-canvas)
    // -----------------------------------------------------------------------

    /// Update the live pan from a raw screen-space translation.
    pub fn update_pan(&mut self, screen_translation: Vec2, view: &ViewState) {
        self.gesture_pan = screen_translation / self.zoom_scale(view);
    }

    /// Complete a pan, returning the zoom-divided delta the controller
    /// folds into steady-state pan. Live pan resets to neutral.
    pub fn end_pan(&mut self, screen_translation: Vec2, view: &ViewState) -> Vec2 {
        let delta = screen_translation / self.zoom_scale(view);
        self.gesture_pan = Vec2::ZERO;
        delta
    }

    // -----------------------------------------------------------------------
    // Drag (per-sticker, Idle -> Dragging -> Idle)
    // -----------------------------------------------------------------------

    /// Enter the `Dragging` state for one sticker.
    pub fn begin_drag(&mut self, id: StickerId) {
        self.drag = Some(DragGesture {
            target: id,
            translation: Vec2::ZERO,
        });
    }

    /// Update the live drag from a raw screen-space translation.
    ///
    /// No-op when no drag is active.
    pub fn update_drag(&mut self, screen_translation: Vec2, view: &ViewState) {
        let zoom = self.zoom_scale(view);
        if let Some(drag) = &mut self.drag {
            drag.translation = screen_translation / zoom;
        }
    }

    /// Complete the active drag, returning who moves and by how much.
    ///
    /// Returns `None` when no drag was active. The engine returns to
    /// `Idle` either way.
    pub fn end_drag(&mut self, screen_translation: Vec2, view: &ViewState) -> Option<DragOutcome> {
        let drag = self.drag.take()?;
        let offset = screen_translation / self.zoom_scale(view);
        let targets = if self.is_selected(drag.target) {
            let mut ids: Vec<_> = self.selection.iter().copied().collect();
            ids.sort_unstable();
            ids
        } else {
            vec![drag.target]
        };
        #[allow(clippy::cast_possible_truncation)]
        let outcome = DragOutcome {
            targets,
            dx: offset.x.round() as i32,
            dy: offset.y.round() as i32,
        };
        tracing::debug!(
            "Drag ended: moving {} stickers by ({}, {})",
            outcome.targets.len(),
            outcome.dx,
            outcome.dy
        );
        Some(outcome)
    }
}

/// Zoom that fits an image of `image` natural size into `viewport`.
///
/// Returns `None` when any dimension is zero or negative (no-op fit).
#[must_use]
pub fn fit_zoom(image: Vec2, viewport: Vec2) -> Option<f32> {
    if image.x <= 0.0 || image.y <= 0.0 || viewport.x <= 0.0 || viewport.y <= 0.0 {
        return None;
    }
    Some((viewport.x / image.x).min(viewport.y / image.y))
}
