//! Pure calculation functions for image dimensions and placement.
//!
//! All functions here are pure and testable without any I/O or images. The
//! operation model uses them to predict output dimensions before dispatch, and
//! the backend uses the same functions to do the actual work, so the two can
//! never disagree.

use crate::pipeline::WatermarkPosition;
use crate::types::Dimensions;

/// Distance between a watermark and the image edge for non-centered positions.
pub const WATERMARK_PADDING: u32 = 10;

/// Calculate the target size of a resize.
///
/// - `percentage` wins when present and scales both axes.
/// - Both `width` and `height`: with `maintain_aspect` the image is fit
///   inside the box (smaller ratio), otherwise it is stretched to it.
/// - Only one side: with `maintain_aspect` the other side follows
///   proportionally, otherwise it keeps its original length.
///
/// Sides never round down to zero.
///
/// # Examples
/// ```
/// # use cropline::imaging::calculate_resize_target;
/// # use cropline::types::Dimensions;
/// let src = Dimensions::new(1600, 900);
/// assert_eq!(calculate_resize_target(src, Some(800), None, None, true), Dimensions::new(800, 450));
/// assert_eq!(calculate_resize_target(src, None, None, Some(50.0), true), Dimensions::new(800, 450));
/// ```
pub fn calculate_resize_target(
    source: Dimensions,
    width: Option<u32>,
    height: Option<u32>,
    percentage: Option<f64>,
    maintain_aspect: bool,
) -> Dimensions {
    let (src_w, src_h) = (source.width as f64, source.height as f64);

    let (w, h) = if let Some(pct) = percentage {
        let factor = pct / 100.0;
        (src_w * factor, src_h * factor)
    } else {
        match (width, height) {
            (Some(w), Some(h)) if maintain_aspect => {
                let ratio = (w as f64 / src_w).min(h as f64 / src_h);
                (src_w * ratio, src_h * ratio)
            }
            (Some(w), Some(h)) => (w as f64, h as f64),
            (Some(w), None) if maintain_aspect => (w as f64, src_h * w as f64 / src_w),
            (Some(w), None) => (w as f64, src_h),
            (None, Some(h)) if maintain_aspect => (src_w * h as f64 / src_h, h as f64),
            (None, Some(h)) => (src_w, h as f64),
            (None, None) => (src_w, src_h),
        }
    };

    Dimensions::new(round_side(w), round_side(h))
}

fn round_side(v: f64) -> u32 {
    if v.is_finite() {
        (v.round() as u32).max(1)
    } else {
        1
    }
}

/// Top-left corner for a watermark of size `mark` on an image of size `image`.
///
/// `custom` is only consulted for [`WatermarkPosition::Custom`]. Positions
/// that would fall off the left/top edge saturate to zero.
pub fn calculate_watermark_position(
    position: WatermarkPosition,
    image: Dimensions,
    mark: Dimensions,
    custom: Option<(u32, u32)>,
) -> (u32, u32) {
    let pad = WATERMARK_PADDING;
    let left = pad;
    let top = pad;
    let center_x = image.width.saturating_sub(mark.width) / 2;
    let center_y = image.height.saturating_sub(mark.height) / 2;
    let right = image.width.saturating_sub(mark.width + pad);
    let bottom = image.height.saturating_sub(mark.height + pad);

    match position {
        WatermarkPosition::TopLeft => (left, top),
        WatermarkPosition::TopCenter => (center_x, top),
        WatermarkPosition::TopRight => (right, top),
        WatermarkPosition::CenterLeft => (left, center_y),
        WatermarkPosition::Center => (center_x, center_y),
        WatermarkPosition::CenterRight => (right, center_y),
        WatermarkPosition::BottomLeft => (left, bottom),
        WatermarkPosition::BottomCenter => (center_x, bottom),
        WatermarkPosition::BottomRight => (right, bottom),
        WatermarkPosition::Custom => custom.unwrap_or((0, 0)),
    }
}

/// Grid geometry for a collage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollageLayout {
    pub rows: u32,
    pub columns: u32,
    pub gap: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl CollageLayout {
    pub fn total(&self) -> Dimensions {
        Dimensions::new(
            self.columns * self.cell_width + (self.columns - 1) * self.gap,
            self.rows * self.cell_height + (self.rows - 1) * self.gap,
        )
    }

    /// Top-left corner of the cell at row-major `index`.
    pub fn cell_origin(&self, index: u32) -> (u32, u32) {
        let row = index / self.columns;
        let col = index % self.columns;
        (
            col * (self.cell_width + self.gap),
            row * (self.cell_height + self.gap),
        )
    }
}

/// Lay out a `rows x columns` grid whose cells share the aspect of `first`.
///
/// Cell width is derived from `output_width` when given (after removing the
/// gaps), otherwise it is `first.width`. Returns `None` when the grid is
/// empty or `output_width` leaves no room for a cell.
pub fn calculate_collage_layout(
    first: Dimensions,
    rows: u32,
    columns: u32,
    gap: u32,
    output_width: Option<u32>,
) -> Option<CollageLayout> {
    if rows == 0 || columns == 0 || first.width == 0 || first.height == 0 {
        return None;
    }
    let cell_width = match output_width {
        Some(total) => total.checked_sub((columns - 1).checked_mul(gap)?)? / columns,
        None => first.width,
    };
    if cell_width == 0 {
        return None;
    }
    let cell_height = round_side(cell_width as f64 * first.height as f64 / first.width as f64);
    let layout = CollageLayout {
        rows,
        columns,
        gap,
        cell_width,
        cell_height,
    };
    // Reject grids whose total size would not fit in u32.
    layout
        .columns
        .checked_mul(cell_width)?
        .checked_add((columns - 1).checked_mul(gap)?)?;
    layout
        .rows
        .checked_mul(cell_height)?
        .checked_add((rows - 1).checked_mul(gap)?)?;
    Some(layout)
}

/// Space saved by re-encoding, as a percentage of the original size.
///
/// Negative when the output grew. Zero for an empty original.
pub fn calculate_compression_ratio(original: u64, processed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - processed as f64) / original as f64 * 100.0
}

/// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional) into RGBA.
pub fn parse_hex_color(s: &str) -> Option<[u8; 4]> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some([channel(0)?, channel(2)?, channel(4)?, alpha])
}
