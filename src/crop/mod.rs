//! Interactive crop overlay geometry.
//!
//! Pointer events arrive in screen space, are mapped into image space by the
//! [`viewport`], drive the [`drag`] state machine, and every rectangle it
//! produces is clamped by [`geometry::constrain`]. Crop rectangles are never
//! stored in screen coordinates.
//!
//! | Module | Role |
//! |---|---|
//! | [`geometry`] | `Point`, `Rectangle`, the constraint engine |
//! | [`viewport`] | `ViewportTransform`: screen ↔ image mapping, fit, zoom, pan |
//! | [`drag`] | nine-handle drag state machine and handle hit-testing |

pub mod drag;
pub mod geometry;
pub mod viewport;

pub use drag::{CropDrag, DragState, HandleKind, HandleSession, hit_test, recompute};
pub use geometry::{MIN_CROP_SIZE, PixelRegion, Point, Rectangle, constrain};
pub use viewport::{ViewportError, ViewportTransform, to_image_space, to_screen_space};
