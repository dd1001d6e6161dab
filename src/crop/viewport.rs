//! Coordinate mapping between viewport screen space and image pixel space.
//!
//! `image = (screen - offset) / scale` and `screen = image * scale + offset`.
//! A [`ViewportTransform`] can only be built through [`ViewportTransform::new`],
//! which refuses a zero, negative, or non-finite scale, so the mapping
//! functions themselves never divide by zero.

use super::geometry::{Point, Rectangle};
use crate::types::Dimensions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewportError {
    #[error("invalid viewport: scale={scale}, offset=({offset_x}, {offset_y})")]
    InvalidViewport {
        scale: f64,
        offset_x: f64,
        offset_y: f64,
    },
}

/// How image space is placed on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportTransform {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl ViewportTransform {
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Result<Self, ViewportError> {
        if !(scale.is_finite() && scale > 0.0 && offset_x.is_finite() && offset_y.is_finite()) {
            return Err(ViewportError::InvalidViewport {
                scale,
                offset_x,
                offset_y,
            });
        }
        Ok(Self {
            scale,
            offset_x,
            offset_y,
        })
    }

    /// Unscaled, unshifted mapping.
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Fit `image` inside a `container_width x container_height` viewport,
    /// preserving aspect ratio and centering the result.
    pub fn fit(
        image: Dimensions,
        container_width: f64,
        container_height: f64,
    ) -> Result<Self, ViewportError> {
        let scale = (container_width / image.width as f64).min(container_height / image.height as f64);
        let offset_x = (container_width - image.width as f64 * scale) / 2.0;
        let offset_y = (container_height - image.height as f64 * scale) / 2.0;
        Self::new(scale, offset_x, offset_y)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }

    pub fn to_image_space(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset_x) / self.scale,
            (screen.y - self.offset_y) / self.scale,
        )
    }

    pub fn to_screen_space(&self, image: Point) -> Point {
        Point::new(
            image.x * self.scale + self.offset_x,
            image.y * self.scale + self.offset_y,
        )
    }

    /// Map an image-space rectangle onto the screen.
    pub fn rect_to_screen(&self, rect: &Rectangle) -> Rectangle {
        let origin = self.to_screen_space(Point::new(rect.x, rect.y));
        Rectangle::new(
            origin.x,
            origin.y,
            rect.width * self.scale,
            rect.height * self.scale,
        )
    }

    /// Multiply the scale by `factor`, clamped to `[min_zoom, max_zoom]`,
    /// keeping the image point under `anchor` (a screen point) fixed.
    ///
    /// Bounds that are non-finite, non-positive, or inverted yield
    /// [`ViewportError::InvalidViewport`].
    pub fn zoom_at(
        &self,
        anchor: Point,
        factor: f64,
        min_zoom: f64,
        max_zoom: f64,
    ) -> Result<Self, ViewportError> {
        let requested = self.scale * factor;
        let bounds_ok = min_zoom.is_finite()
            && max_zoom.is_finite()
            && 0.0 < min_zoom
            && min_zoom <= max_zoom;
        if !bounds_ok {
            return Err(ViewportError::InvalidViewport {
                scale: requested,
                offset_x: self.offset_x,
                offset_y: self.offset_y,
            });
        }
        let pinned = self.to_image_space(anchor);
        let scale = requested.clamp(min_zoom, max_zoom);
        Self::new(
            scale,
            anchor.x - pinned.x * scale,
            anchor.y - pinned.y * scale,
        )
    }

    /// Shift the image by a screen-space delta.
    pub fn pan(&self, dx: f64, dy: f64) -> Result<Self, ViewportError> {
        Self::new(self.scale, self.offset_x + dx, self.offset_y + dy)
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Serialized form goes back through [`ViewportTransform::new`].
impl<'de> Deserialize<'de> for ViewportTransform {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            scale: f64,
            offset_x: f64,
            offset_y: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.scale, raw.offset_x, raw.offset_y).map_err(serde::de::Error::custom)
    }
}

pub fn to_image_space(screen: Point, viewport: &ViewportTransform) -> Point {
    viewport.to_image_space(screen)
}

pub fn to_screen_space(image: Point, viewport: &ViewportTransform) -> Point {
    viewport.to_screen_space(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_scale_is_rejected() {
        let err = ViewportTransform::new(0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, ViewportError::InvalidViewport { scale, .. } if scale == 0.0));
    }

    #[test]
    fn negative_and_nan_scale_rejected() {
        assert!(ViewportTransform::new(-1.0, 0.0, 0.0).is_err());
        assert!(ViewportTransform::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(ViewportTransform::new(f64::INFINITY, 0.0, 0.0).is_err());
    }

    #[test]
    fn non_finite_offset_rejected() {
        assert!(ViewportTransform::new(1.0, f64::NAN, 0.0).is_err());
        assert!(ViewportTransform::new(1.0, 0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn screen_to_image_subtracts_offset_then_divides() {
        let vp = ViewportTransform::new(0.5, 20.0, 10.0).unwrap();
        assert_eq!(vp.to_image_space(Point::new(70.0, 60.0)), Point::new(100.0, 100.0));
        assert_eq!(to_screen_space(Point::new(100.0, 100.0), &vp), Point::new(70.0, 60.0));
    }

    #[test]
    fn fit_centers_landscape_in_square() {
        let vp = ViewportTransform::fit(Dimensions::new(1920, 1080), 960.0, 960.0).unwrap();
        assert_eq!(vp.scale(), 0.5);
        assert_eq!(vp.offset(), Point::new(0.0, 210.0));
    }

    #[test]
    fn fit_into_empty_container_is_invalid() {
        assert!(ViewportTransform::fit(Dimensions::new(100, 100), 0.0, 500.0).is_err());
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let vp = ViewportTransform::new(1.0, 0.0, 0.0).unwrap();
        let anchor = Point::new(200.0, 100.0);
        let zoomed = vp.zoom_at(anchor, 2.0, 0.1, 10.0).unwrap();
        assert_eq!(zoomed.scale(), 2.0);
        assert_eq!(zoomed.to_screen_space(vp.to_image_space(anchor)), anchor);
    }

    #[test]
    fn zoom_is_clamped_to_bounds() {
        let vp = ViewportTransform::new(8.0, 0.0, 0.0).unwrap();
        let zoomed = vp.zoom_at(Point::default(), 4.0, 0.1, 10.0).unwrap();
        assert_eq!(zoomed.scale(), 10.0);
    }

    #[test]
    fn unusable_zoom_bounds_are_rejected() {
        let vp = ViewportTransform::identity();
        for (min, max) in [(5.0, 1.0), (f64::NAN, 10.0), (0.1, f64::NAN), (0.0, 10.0)] {
            assert!(matches!(
                vp.zoom_at(Point::default(), 2.0, min, max),
                Err(ViewportError::InvalidViewport { .. })
            ));
        }
    }

    #[test]
    fn pan_moves_offset() {
        let vp = ViewportTransform::identity().pan(15.0, -5.0).unwrap();
        assert_eq!(vp.offset(), Point::new(15.0, -5.0));
    }

    #[test]
    fn rect_to_screen_scales_size() {
        let vp = ViewportTransform::new(2.0, 5.0, 5.0).unwrap();
        let r = vp.rect_to_screen(&Rectangle::new(10.0, 10.0, 20.0, 30.0));
        assert_eq!(r, Rectangle::new(25.0, 25.0, 40.0, 60.0));
    }

    #[test]
    fn deserialize_validates() {
        let ok: ViewportTransform =
            serde_json::from_str(r#"{"scale":2.0,"offset_x":1.0,"offset_y":0.0}"#).unwrap();
        assert_eq!(ok.scale(), 2.0);
        let bad = serde_json::from_str::<ViewportTransform>(
            r#"{"scale":0.0,"offset_x":1.0,"offset_y":0.0}"#,
        );
        assert!(bad.is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn screen_image_round_trip(
                px in -1.0e6f64..1.0e6, py in -1.0e6f64..1.0e6,
                scale in 0.01f64..100.0,
                ox in -1.0e4f64..1.0e4, oy in -1.0e4f64..1.0e4,
            ) {
                let vp = ViewportTransform::new(scale, ox, oy).unwrap();
                let p = Point::new(px, py);
                let back = to_screen_space(to_image_space(p, &vp), &vp);
                let tol = 1e-9 * (1.0 + px.abs().max(py.abs()) + ox.abs().max(oy.abs()));
                prop_assert!((back.x - p.x).abs() <= tol, "{back:?} vs {p:?}");
                prop_assert!((back.y - p.y).abs() <= tol, "{back:?} vs {p:?}");
            }
        }
    }
}
