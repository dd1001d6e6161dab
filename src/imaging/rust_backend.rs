//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_decoder` (header only) |
//! | Decode (PNG, JPEG, WebP, GIF, BMP, TIFF, ICO) | `image` crate decoders |
//! | Crop / rotate / flip | `DynamicImage::crop_imm`, `rotate90/180/270`, `fliph/flipv` |
//! | Resize | `DynamicImage::resize_exact` with the requested filter |
//! | Watermark (image) | `resize_exact(Lanczos3)` + `imageops::overlay` |
//! | Watermark (text) | `ab_glyph` outline rasterization + `imageops::overlay` |
//! | Mosaic | block averaging on an `RgbaImage` |
//! | Collage | `RgbImage` canvas + `imageops::overlay` per cell |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → others | `DynamicImage::write_to` (lossless encoders) |

use super::backend::{BackendError, ImageBackend, WatermarkInfo};
use super::calculations::{CollageLayout, calculate_watermark_position, parse_hex_color};
use super::params::{Encoding, ExportFormat};
use crate::crop::PixelRegion;
use crate::pipeline::{
    CollageOp, MosaicOp, MosaicPoint, MosaicRegion, ResizeAlgorithm, TextWatermark, WatermarkKind,
    WatermarkOp,
};
use crate::types::{ColorSpace, Dimensions, ImageInfo};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, Rgb, RgbImage, Rgba, RgbaImage};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn filter_for(algorithm: ResizeAlgorithm) -> FilterType {
    match algorithm {
        ResizeAlgorithm::Nearest => FilterType::Nearest,
        ResizeAlgorithm::Triangle => FilterType::Triangle,
        ResizeAlgorithm::CatmullRom => FilterType::CatmullRom,
        ResizeAlgorithm::Gaussian => FilterType::Gaussian,
        ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
    }
}

fn image_format(format: ExportFormat) -> ImageFormat {
    match format {
        ExportFormat::Png => ImageFormat::Png,
        ExportFormat::Jpeg => ImageFormat::Jpeg,
        ExportFormat::Webp => ImageFormat::WebP,
        ExportFormat::Gif => ImageFormat::Gif,
        ExportFormat::Bmp => ImageFormat::Bmp,
        ExportFormat::Tiff => ImageFormat::Tiff,
        ExportFormat::Ico => ImageFormat::Ico,
    }
}

fn decode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn encode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::Encode {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Load and decode an image from disk, sniffing the format from content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| decode_error(path, e))
}

/// Encode and write `img`, returning the size of the written file.
fn save_image(img: &DynamicImage, path: &Path, encoding: &Encoding) -> Result<u64, BackendError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    match encoding.format {
        ExportFormat::Jpeg => {
            let rgb = img.to_rgb8();
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut writer,
                encoding.quality.value() as u8,
            );
            rgb.write_with_encoder(encoder)
                .map_err(|e| encode_error(path, e))?;
        }
        // PNG and TIFF keep 16-bit depth; the rest only take 8-bit.
        ExportFormat::Png | ExportFormat::Tiff => {
            img.write_to(&mut writer, image_format(encoding.format))
                .map_err(|e| encode_error(path, e))?;
        }
        other => {
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut writer, image_format(other))
                .map_err(|e| encode_error(path, e))?;
        }
    }
    writer.flush()?;
    drop(writer);
    Ok(fs::metadata(path)?.len())
}

// ============================================================================
// Watermark
// ============================================================================

/// Rasterize `text` into a tight RGBA image.
fn render_text(options: &TextWatermark) -> Result<RgbaImage, BackendError> {
    use ab_glyph::{Font as _, FontVec, GlyphId, ScaleFont as _, point};

    let bytes = fs::read(&options.font_path)?;
    let font = FontVec::try_from_vec(bytes).map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Invalid font {}: {e}",
            options.font_path.display()
        ))
    })?;
    let [r, g, b, a] = parse_hex_color(&options.color).ok_or_else(|| {
        BackendError::ProcessingFailed(format!("Invalid color {:?}", options.color))
    })?;

    let scaled = font.as_scaled(options.font_size);
    let ascent = scaled.ascent();
    let height = (ascent - scaled.descent()).ceil().max(1.0) as u32;

    // Lay out once to find the width, then draw.
    let mut glyphs = Vec::new();
    let mut caret = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in options.text.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            caret += scaled.kern(p, id);
        }
        glyphs.push(id.with_scale_and_position(options.font_size, point(caret, ascent)));
        caret += scaled.h_advance(id);
        prev = Some(id);
    }
    let width = caret.ceil().max(1.0) as u32;

    let mut canvas = RgbaImage::new(width, height);
    for glyph in glyphs {
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|px, py, coverage| {
            let x = bounds.min.x as i64 + px as i64;
            let y = bounds.min.y as i64 + py as i64;
            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                return;
            }
            let alpha = (coverage.clamp(0.0, 1.0) * a as f32).round() as u8;
            let pixel = canvas.get_pixel_mut(x as u32, y as u32);
            if alpha > pixel[3] {
                *pixel = Rgba([r, g, b, alpha]);
            }
        });
    }
    Ok(canvas)
}

fn load_image_mark(path: &Path, scale: f32, base: Dimensions) -> Result<RgbaImage, BackendError> {
    let mark = load_image(path)?;
    let width = ((base.width as f32 * scale).round() as u32).max(1);
    let height =
        ((mark.height() as f64 * width as f64 / mark.width().max(1) as f64).round() as u32).max(1);
    Ok(mark
        .resize_exact(width, height, FilterType::Lanczos3)
        .to_rgba8())
}

fn apply_opacity(mark: &mut RgbaImage, opacity: u8) {
    if opacity == 255 {
        return;
    }
    for pixel in mark.pixels_mut() {
        pixel[3] = ((pixel[3] as u32 * opacity as u32) / 255) as u8;
    }
}

// ============================================================================
// Mosaic
// ============================================================================

fn average_color(img: &RgbaImage, x: u32, y: u32, w: u32, h: u32) -> Rgba<u8> {
    let mut sum = [0u64; 4];
    for py in y..y + h {
        for px in x..x + w {
            let p = img.get_pixel(px, py);
            for c in 0..4 {
                sum[c] += p[c] as u64;
            }
        }
    }
    let n = (w as u64 * h as u64).max(1);
    Rgba(sum.map(|s| (s / n) as u8))
}

/// Pixelate the `[x, x+w) × [y, y+h)` box. `inside` filters which blocks and
/// pixels are affected, given their coordinates.
fn pixelate(
    img: &mut RgbaImage,
    (x, y, w, h): (u32, u32, u32, u32),
    block: u32,
    inside: impl Fn(f64, f64) -> bool,
) {
    for by in (y..y + h).step_by(block as usize) {
        for bx in (x..x + w).step_by(block as usize) {
            let bw = block.min(x + w - bx);
            let bh = block.min(y + h - by);
            let center = (bx as f64 + bw as f64 / 2.0, by as f64 + bh as f64 / 2.0);
            if !inside(center.0, center.1) {
                continue;
            }
            let avg = average_color(img, bx, by, bw, bh);
            for py in by..by + bh {
                for px in bx..bx + bw {
                    if inside(px as f64 + 0.5, py as f64 + 0.5) {
                        img.put_pixel(px, py, avg);
                    }
                }
            }
        }
    }
}

fn mosaic_brush(img: &mut RgbaImage, points: &[MosaicPoint], block: u32) {
    let (iw, ih) = img.dimensions();
    for p in points {
        if p.x >= iw || p.y >= ih {
            continue;
        }
        let x0 = p.x.saturating_sub(block);
        let y0 = p.y.saturating_sub(block);
        let x1 = (p.x + block).min(iw);
        let y1 = (p.y + block).min(ih);
        pixelate(img, (x0, y0, x1 - x0, y1 - y0), block, |_, _| true);
    }
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;

    fn identify(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        let file_size = fs::metadata(path)?.len();
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader
            .format()
            .map(|f| format!("{f:?}").to_uppercase())
            .ok_or_else(|| decode_error(path, "unrecognized image format"))?;
        let decoder = reader.into_decoder().map_err(|e| decode_error(path, e))?;
        let (width, height) = decoder.dimensions();
        let color = decoder.color_type();
        let color_space = match (color.has_color(), color.has_alpha()) {
            (true, true) => ColorSpace::Rgba,
            (true, false) => ColorSpace::Rgb,
            (false, true) => ColorSpace::GrayAlpha,
            (false, false) => ColorSpace::Gray,
        };
        Ok(ImageInfo {
            path: path.to_path_buf(),
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            width,
            height,
            format,
            file_size,
            color_space,
            has_alpha: color_space.has_alpha(),
        })
    }

    fn open(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        load_image(path)
    }

    fn dimensions(&self, image: &DynamicImage) -> Dimensions {
        Dimensions::new(image.width(), image.height())
    }

    fn crop(&self, image: DynamicImage, region: PixelRegion) -> Result<DynamicImage, BackendError> {
        if region.x.saturating_add(region.width) > image.width()
            || region.y.saturating_add(region.height) > image.height()
        {
            return Err(BackendError::ProcessingFailed(format!(
                "Crop region {}x{} at ({}, {}) exceeds {}x{} image",
                region.width,
                region.height,
                region.x,
                region.y,
                image.width(),
                image.height()
            )));
        }
        Ok(image.crop_imm(region.x, region.y, region.width, region.height))
    }

    fn rotate(&self, image: DynamicImage, angle: u32) -> Result<DynamicImage, BackendError> {
        match angle {
            0 => Ok(image),
            90 => Ok(image.rotate90()),
            180 => Ok(image.rotate180()),
            270 => Ok(image.rotate270()),
            other => Err(BackendError::ProcessingFailed(format!(
                "Unsupported rotation angle: {other}"
            ))),
        }
    }

    fn flip(
        &self,
        image: DynamicImage,
        horizontal: bool,
        vertical: bool,
    ) -> Result<DynamicImage, BackendError> {
        let image = if horizontal { image.fliph() } else { image };
        Ok(if vertical { image.flipv() } else { image })
    }

    fn resize(
        &self,
        image: DynamicImage,
        target: Dimensions,
        algorithm: ResizeAlgorithm,
    ) -> Result<DynamicImage, BackendError> {
        Ok(image.resize_exact(target.width, target.height, filter_for(algorithm)))
    }

    fn watermark(
        &self,
        image: DynamicImage,
        params: &WatermarkOp,
    ) -> Result<(DynamicImage, WatermarkInfo), BackendError> {
        let base_dims = self.dimensions(&image);
        let mut mark = match params.kind {
            WatermarkKind::Text => {
                let options = params.text.as_ref().ok_or_else(|| {
                    BackendError::ProcessingFailed("Text watermark without text options".into())
                })?;
                render_text(options)?
            }
            WatermarkKind::Image => {
                let options = params.image.as_ref().ok_or_else(|| {
                    BackendError::ProcessingFailed("Image watermark without image options".into())
                })?;
                load_image_mark(&options.path, options.scale, base_dims)?
            }
        };
        apply_opacity(&mut mark, params.opacity);

        let mark_dims = Dimensions::new(mark.width(), mark.height());
        let (x, y) = calculate_watermark_position(
            params.position,
            base_dims,
            mark_dims,
            params.x.zip(params.y),
        );
        let mut base = image.to_rgba8();
        imageops::overlay(&mut base, &mark, x as i64, y as i64);
        let info = WatermarkInfo {
            x,
            y,
            width: mark_dims.width,
            height: mark_dims.height,
        };
        Ok((DynamicImage::ImageRgba8(base), info))
    }

    fn mosaic(&self, image: DynamicImage, params: &MosaicOp) -> Result<DynamicImage, BackendError> {
        let mut img = image.to_rgba8();
        let (iw, ih) = img.dimensions();
        let block = params.block_size.max(1);
        for region in &params.regions {
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
                } if x.saturating_add(*width) > iw || y.saturating_add(*height) > ih => {
                    return Err(BackendError::ProcessingFailed(format!(
                        "Mosaic region ({x}, {y}, {width}x{height}) exceeds {iw}x{ih} image"
                    )));
                }
                MosaicRegion::Rect {
                    x,
                    y,
                    width,
                    height,
                } => pixelate(&mut img, (*x, *y, *width, *height), block, |_, _| true),
                MosaicRegion::Ellipse {
                    x,
                    y,
                    width,
                    height,
                } => {
                    let cx = *x as f64 + *width as f64 / 2.0;
                    let cy = *y as f64 + *height as f64 / 2.0;
                    let rx = (*width as f64 / 2.0).max(0.5);
                    let ry = (*height as f64 / 2.0).max(0.5);
                    pixelate(&mut img, (*x, *y, *width, *height), block, |px, py| {
                        let dx = (px - cx) / rx;
                        let dy = (py - cy) / ry;
                        dx * dx + dy * dy <= 1.0
                    });
                }
                MosaicRegion::Brush { points } => mosaic_brush(&mut img, points, block),
            }
        }
        Ok(DynamicImage::ImageRgba8(img))
    }

    fn collage(
        &self,
        image: DynamicImage,
        params: &CollageOp,
        layout: &CollageLayout,
    ) -> Result<DynamicImage, BackendError> {
        let total = layout.total();
        let [r, g, b] = params.background_color;
        let mut canvas = RgbImage::from_pixel(total.width, total.height, Rgb([r, g, b]));

        let mut place = |index: u32, cell: &DynamicImage| {
            let resized = cell
                .resize_exact(layout.cell_width, layout.cell_height, FilterType::Lanczos3)
                .to_rgb8();
            let (x, y) = layout.cell_origin(index);
            imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
        };

        place(0, &image);
        for (i, path) in params.image_paths.iter().enumerate() {
            let cell = load_image(path)?;
            place(i as u32 + 1, &cell);
        }
        Ok(DynamicImage::ImageRgb8(canvas))
    }

    fn save(
        &self,
        image: &DynamicImage,
        path: &Path,
        encoding: &Encoding,
    ) -> Result<u64, BackendError> {
        save_image(image, path, encoding)
    }
}
