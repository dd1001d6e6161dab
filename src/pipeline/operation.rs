//! Typed transform operations and their parameter validation.
//!
//! An [`Operation`] is immutable once it is in a pipeline; edits replace the
//! whole instance. Validation is per-kind only (bounds on the operation's own
//! parameters, checked against the dimensions of the image it will receive),
//! there is no cross-operation validation.
//!
//! ## Serialized form
//!
//! Operations round-trip through JSON with an internal `type` tag, which is
//! also the format of `--pipeline` files on the command line:
//!
//! ```json
//! [
//!   { "type": "crop", "x": 100, "y": 100, "width": 400, "height": 300 },
//!   { "type": "rotate", "angle": 90 },
//!   { "type": "resize", "percentage": 50 }
//! ]
//! ```

use crate::crop::Rectangle;
use crate::imaging::{calculate_collage_layout, calculate_resize_target, parse_hex_color};
use crate::types::Dimensions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("invalid {operation} parameters: {reason}")]
    InvalidParameters {
        operation: OperationKind,
        reason: String,
    },
    #[error("operation index {index} out of range (pipeline has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Largest width/height a resize may ask for.
pub const MAX_RESIZE_SIDE: u32 = 65_536;
/// Largest resize percentage.
pub const MAX_RESIZE_PERCENTAGE: f64 = 1000.0;
/// Accepted mosaic block sizes.
pub const BLOCK_SIZE_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Crop,
    Rotate,
    Flip,
    Resize,
    Watermark,
    Mosaic,
    Collage,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Crop => "crop",
            OperationKind::Rotate => "rotate",
            OperationKind::Flip => "flip",
            OperationKind::Resize => "resize",
            OperationKind::Watermark => "watermark",
            OperationKind::Mosaic => "mosaic",
            OperationKind::Collage => "collage",
        };
        f.write_str(name)
    }
}

/// One step of a transform pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Crop(Rectangle),
    /// Clockwise rotation in degrees.
    Rotate {
        angle: u32,
    },
    Flip {
        #[serde(default)]
        horizontal: bool,
        #[serde(default)]
        vertical: bool,
    },
    Resize(ResizeOp),
    Watermark(WatermarkOp),
    Mosaic(MosaicOp),
    Collage(CollageOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeAlgorithm {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default = "default_true")]
    pub maintain_aspect: bool,
    #[serde(default)]
    pub algorithm: ResizeAlgorithm,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkKind {
    Text,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextWatermark {
    pub text: String,
    pub font_size: f32,
    /// `#RRGGBB` or `#RRGGBBAA`.
    pub color: String,
    /// TrueType/OpenType font used to rasterize `text`.
    pub font_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageWatermark {
    pub path: PathBuf,
    /// Watermark width relative to the base image width, in `(0, 1]`.
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOp {
    pub kind: WatermarkKind,
    #[serde(default)]
    pub position: WatermarkPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<u32>,
    /// Multiplier on the watermark's own alpha, 0-255.
    #[serde(default = "default_opacity")]
    pub opacity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextWatermark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageWatermark>,
}

fn default_opacity() -> u8 {
    255
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosaicPoint {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum MosaicRegion {
    Rect {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// Ellipse inscribed in the given bounding box.
    Ellipse {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// Freehand stroke; each point pixelates a square of `block_size` radius.
    Brush { points: Vec<MosaicPoint> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MosaicOp {
    pub regions: Vec<MosaicRegion>,
    pub block_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollageOp {
    /// Images for the cells after the first; the image being edited fills
    /// cell 0.
    #[serde(default)]
    pub image_paths: Vec<PathBuf>,
    pub rows: u32,
    pub columns: u32,
    #[serde(default)]
    pub gap: u32,
    #[serde(default = "default_background")]
    pub background_color: [u8; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_width: Option<u32>,
}

fn default_background() -> [u8; 3] {
    [255, 255, 255]
}

fn invalid(operation: OperationKind, reason: impl Into<String>) -> OperationError {
    OperationError::InvalidParameters {
        operation,
        reason: reason.into(),
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Crop(_) => OperationKind::Crop,
            Operation::Rotate { .. } => OperationKind::Rotate,
            Operation::Flip { .. } => OperationKind::Flip,
            Operation::Resize(_) => OperationKind::Resize,
            Operation::Watermark(_) => OperationKind::Watermark,
            Operation::Mosaic(_) => OperationKind::Mosaic,
            Operation::Collage(_) => OperationKind::Collage,
        }
    }

    /// Check this operation's parameters against the image it will receive.
    pub fn validate(&self, input: Dimensions) -> Result<(), OperationError> {
        match self {
            Operation::Crop(rect) => validate_crop(rect, input),
            Operation::Rotate { angle } => match angle {
                0 | 90 | 180 | 270 => Ok(()),
                other => Err(invalid(
                    OperationKind::Rotate,
                    format!("angle must be one of 0, 90, 180, 270 (got {other})"),
                )),
            },
            Operation::Flip { .. } => Ok(()),
            Operation::Resize(op) => op.validate(),
            Operation::Watermark(op) => op.validate(input),
            Operation::Mosaic(op) => op.validate(input),
            Operation::Collage(op) => op.validate(input),
        }
    }

    /// Dimensions of the image this operation produces from `input`.
    ///
    /// Only meaningful for operations that passed [`validate`](Self::validate).
    pub fn output_dimensions(&self, input: Dimensions) -> Dimensions {
        match self {
            Operation::Crop(rect) => {
                let region = rect.to_pixel_region(input);
                Dimensions::new(region.width, region.height)
            }
            Operation::Rotate { angle: 90 | 270 } => input.transposed(),
            Operation::Rotate { .. } | Operation::Flip { .. } => input,
            Operation::Resize(op) => op.target(input),
            Operation::Watermark(_) | Operation::Mosaic(_) => input,
            Operation::Collage(op) => calculate_collage_layout(
                input,
                op.rows,
                op.columns,
                op.gap,
                op.output_width,
            )
            .map(|layout| layout.total())
            .unwrap_or(input),
        }
    }

    /// One-line human description, used in CLI listings and logs.
    pub fn summary(&self) -> String {
        match self {
            Operation::Crop(r) => format!(
                "crop {}x{} at ({}, {})",
                r.width.round(),
                r.height.round(),
                r.x.round(),
                r.y.round()
            ),
            Operation::Rotate { angle } => format!("rotate {angle}°"),
            Operation::Flip {
                horizontal,
                vertical,
            } => match (horizontal, vertical) {
                (true, true) => "flip both".to_string(),
                (true, false) => "flip horizontal".to_string(),
                (false, true) => "flip vertical".to_string(),
                (false, false) => "flip none".to_string(),
            },
            Operation::Resize(op) => match (op.percentage, op.width, op.height) {
                (Some(p), _, _) => format!("resize {p}%"),
                (None, Some(w), Some(h)) => format!("resize {w}x{h}"),
                (None, Some(w), None) => format!("resize width {w}"),
                (None, None, Some(h)) => format!("resize height {h}"),
                (None, None, None) => "resize".to_string(),
            },
            Operation::Watermark(op) => format!("watermark {:?} {:?}", op.kind, op.position),
            Operation::Mosaic(op) => format!(
                "mosaic {} region(s), block {}",
                op.regions.len(),
                op.block_size
            ),
            Operation::Collage(op) => format!("collage {}x{}", op.rows, op.columns),
        }
    }
}

fn validate_crop(rect: &Rectangle, input: Dimensions) -> Result<(), OperationError> {
    if rect.is_valid_within(input.width, input.height) {
        Ok(())
    } else {
        Err(invalid(
            OperationKind::Crop,
            format!(
                "rectangle ({}, {}, {}x{}) is not a valid crop of a {}x{} image",
                rect.x, rect.y, rect.width, rect.height, input.width, input.height
            ),
        ))
    }
}

impl ResizeOp {
    pub fn validate(&self) -> Result<(), OperationError> {
        let kind = OperationKind::Resize;
        if self.width.is_none() && self.height.is_none() && self.percentage.is_none() {
            return Err(invalid(
                kind,
                "at least one of width, height, percentage is required",
            ));
        }
        for (name, side) in [("width", self.width), ("height", self.height)] {
            if let Some(v) = side {
                if v == 0 || v > MAX_RESIZE_SIDE {
                    return Err(invalid(
                        kind,
                        format!("{name} must be 1-{MAX_RESIZE_SIDE} (got {v})"),
                    ));
                }
            }
        }
        if let Some(p) = self.percentage {
            if !(p.is_finite() && p > 0.0 && p <= MAX_RESIZE_PERCENTAGE) {
                return Err(invalid(
                    kind,
                    format!("percentage must be in (0, {MAX_RESIZE_PERCENTAGE}] (got {p})"),
                ));
            }
        }
        Ok(())
    }

    pub fn target(&self, input: Dimensions) -> Dimensions {
        calculate_resize_target(
            input,
            self.width,
            self.height,
            self.percentage,
            self.maintain_aspect,
        )
    }
}

impl WatermarkOp {
    pub fn validate(&self, input: Dimensions) -> Result<(), OperationError> {
        let kind = OperationKind::Watermark;
        if self.position == WatermarkPosition::Custom {
            match (self.x, self.y) {
                (Some(x), Some(y)) if x < input.width && y < input.height => {}
                (Some(x), Some(y)) => {
                    return Err(invalid(
                        kind,
                        format!(
                            "custom position ({x}, {y}) is outside the {}x{} image",
                            input.width, input.height
                        ),
                    ));
                }
                _ => return Err(invalid(kind, "custom position requires both x and y")),
            }
        }
        match self.kind {
            WatermarkKind::Text => {
                let Some(text) = &self.text else {
                    return Err(invalid(kind, "text watermark requires text options"));
                };
                if text.text.trim().is_empty() {
                    return Err(invalid(kind, "watermark text is empty"));
                }
                if !(text.font_size.is_finite() && text.font_size > 0.0) {
                    return Err(invalid(
                        kind,
                        format!("font size must be positive (got {})", text.font_size),
                    ));
                }
                if parse_hex_color(&text.color).is_none() {
                    return Err(invalid(
                        kind,
                        format!("color must be #RRGGBB or #RRGGBBAA (got {:?})", text.color),
                    ));
                }
                if text.font_path.as_os_str().is_empty() {
                    return Err(invalid(kind, "text watermark requires a font path"));
                }
            }
            WatermarkKind::Image => {
                let Some(image) = &self.image else {
                    return Err(invalid(kind, "image watermark requires image options"));
                };
                if image.path.as_os_str().is_empty() {
                    return Err(invalid(kind, "image watermark requires a path"));
                }
                if !(image.scale.is_finite() && image.scale > 0.0 && image.scale <= 1.0) {
                    return Err(invalid(
                        kind,
                        format!("scale must be in (0, 1] (got {})", image.scale),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl MosaicOp {
    pub fn validate(&self, input: Dimensions) -> Result<(), OperationError> {
        let kind = OperationKind::Mosaic;
        if !BLOCK_SIZE_RANGE.contains(&self.block_size) {
            return Err(invalid(
                kind,
                format!("block size must be 1-100 (got {})", self.block_size),
            ));
        }
        if self.regions.is_empty() {
            return Err(invalid(kind, "at least one region is required"));
        }
        for (i, region) in self.regions.iter().enumerate() {
            match region {
                MosaicRegion::Rect {
                    x,
                    y,
                    width,
                    height,
                }
                | MosaicRegion::Ellipse {
                    x,
                    y,
                    width,
                    height,
                } => {
                    let fits = *width > 0
                        && *height > 0
                        && x.checked_add(*width).is_some_and(|r| r <= input.width)
                        && y.checked_add(*height).is_some_and(|b| b <= input.height);
                    if !fits {
                        return Err(invalid(
                            kind,
                            format!(
                                "region {i} ({x}, {y}, {width}x{height}) is outside the {}x{} image",
                                input.width, input.height
                            ),
                        ));
                    }
                }
                MosaicRegion::Brush { points } => {
                    if points.is_empty() {
                        return Err(invalid(kind, format!("brush region {i} has no points")));
                    }
                }
            }
        }
        Ok(())
    }
}

impl CollageOp {
    pub fn cell_count(&self) -> u64 {
        self.rows as u64 * self.columns as u64
    }

    pub fn validate(&self, input: Dimensions) -> Result<(), OperationError> {
        let kind = OperationKind::Collage;
        if self.rows == 0 || self.columns == 0 {
            return Err(invalid(kind, "rows and columns must be at least 1"));
        }
        let images = self.image_paths.len() as u64 + 1;
        if images > self.cell_count() {
            return Err(invalid(
                kind,
                format!(
                    "{images} images do not fit a {}x{} grid",
                    self.rows, self.columns
                ),
            ));
        }
        if calculate_collage_layout(input, self.rows, self.columns, self.gap, self.output_width)
            .is_none()
        {
            return Err(invalid(
                kind,
                "output width leaves no room for a cell after gaps",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD: Dimensions = Dimensions {
        width: 1920,
        height: 1080,
    };

    fn resize(width: Option<u32>, height: Option<u32>, percentage: Option<f64>) -> Operation {
        Operation::Resize(ResizeOp {
            width,
            height,
            percentage,
            maintain_aspect: true,
            algorithm: ResizeAlgorithm::default(),
        })
    }

    fn image_watermark(scale: f32) -> WatermarkOp {
        WatermarkOp {
            kind: WatermarkKind::Image,
            position: WatermarkPosition::BottomRight,
            x: None,
            y: None,
            opacity: 200,
            text: None,
            image: Some(ImageWatermark {
                path: "logo.png".into(),
                scale,
            }),
        }
    }

    fn assert_invalid(result: Result<(), OperationError>, kind: OperationKind) {
        match result {
            Err(OperationError::InvalidParameters { operation, .. }) => assert_eq!(operation, kind),
            other => panic!("expected InvalidParameters for {kind}, got {other:?}"),
        }
    }

    // =========================================================================
    // Rotate / flip / crop
    // =========================================================================

    #[test]
    fn rotate_45_is_rejected() {
        assert_invalid(
            Operation::Rotate { angle: 45 }.validate(HD),
            OperationKind::Rotate,
        );
    }

    #[test]
    fn rotate_quarter_turns_accepted_and_swap() {
        for angle in [0, 90, 180, 270] {
            assert!(Operation::Rotate { angle }.validate(HD).is_ok());
        }
        assert_eq!(
            Operation::Rotate { angle: 90 }.output_dimensions(HD),
            Dimensions::new(1080, 1920)
        );
        assert_eq!(Operation::Rotate { angle: 180 }.output_dimensions(HD), HD);
    }

    #[test]
    fn crop_must_satisfy_rectangle_invariants() {
        let ok = Operation::Crop(Rectangle::new(100.0, 100.0, 400.0, 300.0));
        assert!(ok.validate(HD).is_ok());
        assert_eq!(ok.output_dimensions(HD), Dimensions::new(400, 300));

        let too_small = Operation::Crop(Rectangle::new(0.0, 0.0, 5.0, 300.0));
        assert_invalid(too_small.validate(HD), OperationKind::Crop);

        let outside = Operation::Crop(Rectangle::new(1900.0, 0.0, 100.0, 100.0));
        assert_invalid(outside.validate(HD), OperationKind::Crop);
    }

    // =========================================================================
    // Resize
    // =========================================================================

    #[test]
    fn resize_requires_some_target() {
        assert_invalid(resize(None, None, None).validate(HD), OperationKind::Resize);
    }

    #[test]
    fn resize_bounds() {
        assert_invalid(resize(Some(0), None, None).validate(HD), OperationKind::Resize);
        assert_invalid(
            resize(None, Some(MAX_RESIZE_SIDE + 1), None).validate(HD),
            OperationKind::Resize,
        );
        assert_invalid(resize(None, None, Some(0.0)).validate(HD), OperationKind::Resize);
        assert_invalid(resize(None, None, Some(1000.5)).validate(HD), OperationKind::Resize);
        assert!(resize(None, None, Some(1000.0)).validate(HD).is_ok());
        assert!(resize(Some(MAX_RESIZE_SIDE), None, None).validate(HD).is_ok());
    }

    #[test]
    fn resize_output_dimensions() {
        assert_eq!(
            resize(None, None, Some(50.0)).output_dimensions(HD),
            Dimensions::new(960, 540)
        );
    }

    // =========================================================================
    // Watermark
    // =========================================================================

    #[test]
    fn image_watermark_scale_bounds() {
        assert!(image_watermark(1.0).validate(HD).is_ok());
        assert_invalid(image_watermark(0.0).validate(HD), OperationKind::Watermark);
        assert_invalid(image_watermark(1.5).validate(HD), OperationKind::Watermark);
    }

    #[test]
    fn custom_position_needs_coordinates_inside_image() {
        let mut op = image_watermark(0.2);
        op.position = WatermarkPosition::Custom;
        assert_invalid(op.validate(HD), OperationKind::Watermark);
        op.x = Some(10);
        op.y = Some(2000);
        assert_invalid(op.validate(HD), OperationKind::Watermark);
        op.y = Some(20);
        assert!(op.validate(HD).is_ok());
    }

    #[test]
    fn text_watermark_checks_color_and_font() {
        let mut op = WatermarkOp {
            kind: WatermarkKind::Text,
            position: WatermarkPosition::Center,
            x: None,
            y: None,
            opacity: 255,
            text: Some(TextWatermark {
                text: "© studio".into(),
                font_size: 32.0,
                color: "#ffffff80".into(),
                font_path: "font.ttf".into(),
            }),
            image: None,
        };
        assert!(op.validate(HD).is_ok());
        if let Some(text) = op.text.as_mut() {
            text.color = "white".into();
        }
        assert_invalid(op.validate(HD), OperationKind::Watermark);
        op.text = None;
        assert_invalid(op.validate(HD), OperationKind::Watermark);
    }

    // =========================================================================
    // Mosaic
    // =========================================================================

    #[test]
    fn mosaic_block_size_and_regions() {
        let rect = MosaicRegion::Rect {
            x: 10,
            y: 10,
            width: 100,
            height: 100,
        };
        let ok = MosaicOp {
            regions: vec![rect.clone()],
            block_size: 10,
        };
        assert!(ok.validate(HD).is_ok());

        let bad_block = MosaicOp {
            regions: vec![rect],
            block_size: 101,
        };
        assert_invalid(bad_block.validate(HD), OperationKind::Mosaic);

        let empty = MosaicOp {
            regions: vec![],
            block_size: 10,
        };
        assert_invalid(empty.validate(HD), OperationKind::Mosaic);
    }

    #[test]
    fn mosaic_region_outside_image_rejected() {
        let op = MosaicOp {
            regions: vec![MosaicRegion::Ellipse {
                x: 1900,
                y: 0,
                width: 100,
                height: 100,
            }],
            block_size: 8,
        };
        assert_invalid(op.validate(HD), OperationKind::Mosaic);
    }

    // =========================================================================
    // Collage
    // =========================================================================

    #[test]
    fn collage_counts_current_image_as_first_cell() {
        let op = CollageOp {
            image_paths: vec!["b.png".into(), "c.png".into(), "d.png".into()],
            rows: 2,
            columns: 2,
            gap: 0,
            background_color: [0, 0, 0],
            output_width: None,
        };
        assert!(op.validate(HD).is_ok());

        let mut crowded = op.clone();
        crowded.image_paths.push("e.png".into());
        assert_invalid(crowded.validate(HD), OperationKind::Collage);

        assert_eq!(
            Operation::Collage(op).output_dimensions(HD),
            Dimensions::new(3840, 2160)
        );
    }

    #[test]
    fn collage_zero_rows_rejected() {
        let op = CollageOp {
            image_paths: vec![],
            rows: 0,
            columns: 2,
            gap: 0,
            background_color: [0, 0, 0],
            output_width: None,
        };
        assert_invalid(op.validate(HD), OperationKind::Collage);
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn pipeline_json_uses_type_tag() {
        let json = r#"[
            {"type": "crop", "x": 100, "y": 100, "width": 400, "height": 300},
            {"type": "rotate", "angle": 90},
            {"type": "flip", "horizontal": true},
            {"type": "resize", "percentage": 50},
            {"type": "mosaic", "block_size": 12,
             "regions": [{"shape": "brush", "points": [{"x": 1, "y": 2}]}]}
        ]"#;
        let ops: Vec<Operation> = serde_json::from_str(json).unwrap();
        assert_eq!(ops.len(), 5);
        assert_eq!(ops[0], Operation::Crop(Rectangle::new(100.0, 100.0, 400.0, 300.0)));
        assert_eq!(
            ops[2],
            Operation::Flip {
                horizontal: true,
                vertical: false
            }
        );
        let Operation::Resize(r) = &ops[3] else {
            panic!("expected resize");
        };
        assert!(r.maintain_aspect);
        assert_eq!(r.algorithm, ResizeAlgorithm::Lanczos3);
    }

    #[test]
    fn kind_display_is_lowercase() {
        assert_eq!(OperationKind::Watermark.to_string(), "watermark");
        assert_eq!(
            Operation::Rotate { angle: 45 }.validate(HD).unwrap_err().to_string(),
            "invalid rotate parameters: angle must be one of 0, 90, 180, 270 (got 45)"
        );
    }
}
