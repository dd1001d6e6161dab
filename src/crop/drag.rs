//! Drag-handle state machine for the crop overlay.
//!
//! ```text
//!            pointer_down(H)                 pointer_up / abandon
//!   Idle ─────────────────────▶ Dragging(H) ───────────────────────▶ Idle
//!                                 │    ▲
//!                                 └────┘ pointer_move: emit constrained rect
//! ```
//!
//! A second `pointer_down` while already dragging is not a transition; it is
//! ignored until the current gesture resolves. Abandoning a drag keeps the
//! last constrained rectangle rather than rolling back to where the gesture
//! started.

use super::geometry::{Point, Rectangle, constrain};
use super::viewport::ViewportTransform;
use crate::types::Dimensions;
use serde::{Deserialize, Serialize};

/// The control point a drag is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    Nw,
    Ne,
    Se,
    Sw,
    N,
    S,
    W,
    E,
    Move,
}

impl HandleKind {
    pub const ALL: [HandleKind; 9] = [
        Self::Nw,
        Self::Ne,
        Self::Se,
        Self::Sw,
        Self::N,
        Self::S,
        Self::W,
        Self::E,
        Self::Move,
    ];

    /// Which rectangle edges follow the pointer: `(left, top, right, bottom)`.
    const fn edges(self) -> (bool, bool, bool, bool) {
        match self {
            Self::Nw => (true, true, false, false),
            Self::Ne => (false, true, true, false),
            Self::Se => (false, false, true, true),
            Self::Sw => (true, false, false, true),
            Self::N => (false, true, false, false),
            Self::S => (false, false, false, true),
            Self::W => (true, false, false, false),
            Self::E => (false, false, true, false),
            Self::Move => (false, false, false, false),
        }
    }

    /// Position of this handle on a rectangle, or `None` for `Move`.
    pub fn anchor_on(self, rect: &Rectangle) -> Option<Point> {
        let cx = rect.x + rect.width / 2.0;
        let cy = rect.y + rect.height / 2.0;
        let p = match self {
            Self::Nw => Point::new(rect.x, rect.y),
            Self::Ne => Point::new(rect.right(), rect.y),
            Self::Se => Point::new(rect.right(), rect.bottom()),
            Self::Sw => Point::new(rect.x, rect.bottom()),
            Self::N => Point::new(cx, rect.y),
            Self::S => Point::new(cx, rect.bottom()),
            Self::W => Point::new(rect.x, cy),
            Self::E => Point::new(rect.right(), cy),
            Self::Move => return None,
        };
        Some(p)
    }
}

/// State captured when a drag begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleSession {
    pub handle: HandleKind,
    /// Pointer position at pointer-down, in image space.
    pub pointer_start: Point,
    pub rect_at_start: Rectangle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging(HandleSession),
}

/// Raw rectangle for a handle moved by `(dx, dy)` image pixels.
///
/// The result may be out of bounds or inverted; it must go through
/// [`constrain`] before anyone sees it.
pub fn recompute(handle: HandleKind, rect: Rectangle, dx: f64, dy: f64) -> Rectangle {
    if handle == HandleKind::Move {
        return Rectangle::new(rect.x + dx, rect.y + dy, rect.width, rect.height);
    }
    let (left, top, right, bottom) = handle.edges();
    let mut out = rect;
    if left {
        out.x += dx;
        out.width -= dx;
    }
    if right {
        out.width += dx;
    }
    if top {
        out.y += dy;
        out.height -= dy;
    }
    if bottom {
        out.height += dy;
    }
    out
}

/// The crop overlay: current rectangle, image bounds, and gesture state.
#[derive(Debug, Clone)]
pub struct CropDrag {
    state: DragState,
    rect: Rectangle,
    bounds: Dimensions,
}

impl CropDrag {
    /// Start with the crop covering the whole image.
    pub fn new(bounds: Dimensions) -> Self {
        Self {
            state: DragState::Idle,
            rect: constrain(Rectangle::full(bounds), bounds.width, bounds.height),
            bounds,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn rect(&self) -> Rectangle {
        self.rect
    }

    pub fn bounds(&self) -> Dimensions {
        self.bounds
    }

    /// Replace the rectangle directly (e.g. from numeric input).
    pub fn set_rect(&mut self, candidate: Rectangle) -> Rectangle {
        self.rect = constrain(candidate, self.bounds.width, self.bounds.height);
        self.rect
    }

    /// Change the image the crop lives on and re-fit the rectangle into it.
    pub fn set_bounds(&mut self, bounds: Dimensions) -> Rectangle {
        self.bounds = bounds;
        self.set_rect(self.rect)
    }

    /// Begin a gesture on `handle` at `pointer` (image space).
    ///
    /// Returns `false` and leaves the current gesture alone if one is
    /// already in progress.
    pub fn pointer_down(&mut self, handle: HandleKind, pointer: Point) -> bool {
        if let DragState::Dragging(active) = self.state {
            tracing::warn!(
                active = ?active.handle,
                requested = ?handle,
                "pointer down during active drag ignored"
            );
            return false;
        }
        tracing::debug!(?handle, x = pointer.x, y = pointer.y, "crop drag start");
        self.state = DragState::Dragging(HandleSession {
            handle,
            pointer_start: pointer,
            rect_at_start: self.rect,
        });
        true
    }

    /// Recompute the rectangle for the pointer's new image-space position.
    ///
    /// Returns the constrained rectangle, or `None` when no drag is active.
    pub fn pointer_move(&mut self, pointer: Point) -> Option<Rectangle> {
        let DragState::Dragging(session) = self.state else {
            return None;
        };
        let dx = pointer.x - session.pointer_start.x;
        let dy = pointer.y - session.pointer_start.y;
        let raw = recompute(session.handle, session.rect_at_start, dx, dy);
        self.rect = constrain(raw, self.bounds.width, self.bounds.height);
        Some(self.rect)
    }

    /// End the gesture. Returns the final rectangle if a drag was active.
    pub fn pointer_up(&mut self) -> Option<Rectangle> {
        match self.state {
            DragState::Dragging(session) => {
                tracing::debug!(handle = ?session.handle, rect = ?self.rect, "crop drag end");
                self.state = DragState::Idle;
                Some(self.rect)
            }
            DragState::Idle => None,
        }
    }

    /// Drop the gesture without a pointer-up; the last rectangle stays.
    pub fn abandon(&mut self) {
        if let DragState::Dragging(session) = self.state {
            tracing::debug!(handle = ?session.handle, "crop drag abandoned");
        }
        self.state = DragState::Idle;
    }

    /// Which handle (if any) sits under a screen-space point.
    ///
    /// Corners win over edges, and edges over the interior `Move` area.
    /// `radius` is the grab distance in screen pixels.
    pub fn handle_at(
        &self,
        screen: Point,
        viewport: &ViewportTransform,
        radius: f64,
    ) -> Option<HandleKind> {
        hit_test(&viewport.rect_to_screen(&self.rect), screen, radius)
    }
}

/// Handle lookup against a rectangle already in screen space.
pub fn hit_test(screen_rect: &Rectangle, p: Point, radius: f64) -> Option<HandleKind> {
    let near = |a: f64, b: f64| (a - b).abs() <= radius;
    let within = |v: f64, lo: f64, hi: f64| v >= lo - radius && v <= hi + radius;

    for corner in [HandleKind::Nw, HandleKind::Ne, HandleKind::Se, HandleKind::Sw] {
        if let Some(anchor) = corner.anchor_on(screen_rect) {
            if near(anchor.x, p.x) && near(anchor.y, p.y) {
                return Some(corner);
            }
        }
    }

    let r = screen_rect;
    let in_x = within(p.x, r.x, r.right());
    let in_y = within(p.y, r.y, r.bottom());
    if in_x && near(p.y, r.y) {
        return Some(HandleKind::N);
    }
    if in_x && near(p.y, r.bottom()) {
        return Some(HandleKind::S);
    }
    if in_y && near(p.x, r.x) {
        return Some(HandleKind::W);
    }
    if in_y && near(p.x, r.right()) {
        return Some(HandleKind::E);
    }
    if r.contains(p) {
        return Some(HandleKind::Move);
    }
    None
}
