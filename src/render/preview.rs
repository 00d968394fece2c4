//! Bounded preview images and the "needs background" heuristic.

use crate::foundation::core::{Bitmap, Rgba8Premul, alloc_bytes, rgba_len};
use crate::foundation::error::{CarError, CarResult};
use crate::foundation::math::luminance;
use crate::render::composite::over;

/// Mean luminance above which a fully opaque image reads as "white".
pub const WHITE_LUMINANCE: f64 = 0.92;
/// Alpha at or below which a pixel counts as transparent (about 10%).
pub const TRANSPARENT_ALPHA: u8 = 26;
/// Share of transparent pixels that makes an image need a background.
pub const TRANSPARENT_SHARE: f64 = 0.25;
/// Backdrop margin around a flagged image, as a fraction of the smaller preview bound.
const BACKDROP_MARGIN_DIVISOR: u32 = 20;

/// Preview bounds and the backdrop used for hard-to-see images.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewOpts {
    /// Widest preview, in pixels.
    pub max_width: u32,
    /// Tallest preview, in pixels.
    pub max_height: u32,
    /// Backdrop for images flagged by [`needs_background`].
    pub background: Rgba8Premul,
}

impl Default for PreviewOpts {
    fn default() -> Self {
        Self {
            max_width: 120,
            max_height: 120,
            background: Rgba8Premul::opaque(0x40, 0x40, 0x40),
        }
    }
}

impl PreviewOpts {
    /// Square bounds of `px` with the default background.
    pub fn square(px: u32) -> Self {
        Self {
            max_width: px,
            max_height: px,
            ..Self::default()
        }
    }
}

/// `true` when the image would be hard to see on a white page: nearly white and opaque, or
/// substantially transparent.
pub fn needs_background(image: &Bitmap) -> bool {
    let total = u64::from(image.width) * u64::from(image.height);
    if total == 0 {
        return false;
    }

    let transparent = image
        .rgba8_premul
        .chunks_exact(4)
        .filter(|px| px[3] <= TRANSPARENT_ALPHA)
        .count() as u64;
    if transparent as f64 >= total as f64 * TRANSPARENT_SHARE {
        return true;
    }
    if !image.is_opaque() {
        return false;
    }

    let mut sum = [0u64; 3];
    for px in image.rgba8_premul.chunks_exact(4) {
        for c in 0..3 {
            sum[c] += u64::from(px[c]);
        }
    }
    let mean = sum.map(|s| s as f64 / total as f64 / 255.0);
    luminance(mean[0], mean[1], mean[2]) > WHITE_LUMINANCE
}

/// Fit `image` inside the preview bounds. Never upscales.
///
/// When [`needs_background`] flags the image it is composited over the background first and
/// then framed by a backdrop margin, so opaque white content still shows against it. The
/// framed preview stays within the bounds.
#[tracing::instrument(skip_all, fields(w = image.width, h = image.height))]
pub fn render_preview(image: &Bitmap, opts: &PreviewOpts) -> CarResult<Bitmap> {
    if opts.max_width == 0 || opts.max_height == 0 {
        return Err(CarError::invalid_format("preview bounds must be non-zero"));
    }
    let flagged = needs_background(image);
    let margin = if flagged { backdrop_margin(opts) } else { 0 };
    let base = if flagged {
        tracing::debug!(margin, "compositing preview over background");
        over_background(image, opts.background)?
    } else {
        image.clone()
    };

    let (w, h) = fit_within(
        image.width,
        image.height,
        opts.max_width - 2 * margin,
        opts.max_height - 2 * margin,
    );
    let scaled = if (w, h) == (image.width, image.height) {
        base
    } else {
        // Premultiplied pixels resample without dark fringes.
        let buf = image::RgbaImage::from_raw(base.width, base.height, base.rgba8_premul.to_vec())
            .ok_or_else(|| CarError::invalid_format("preview bitmap length mismatch"))?;
        let resized = image::imageops::resize(&buf, w, h, image::imageops::FilterType::Triangle);
        Bitmap::new(w, h, resized.into_raw())?
    };
    if margin == 0 {
        return Ok(scaled);
    }
    frame(&scaled, margin, opts.background)
}

/// Margin left around a flagged image; zero when the bounds are too small to spare one.
fn backdrop_margin(opts: &PreviewOpts) -> u32 {
    let margin = (opts.max_width.min(opts.max_height) / BACKDROP_MARGIN_DIVISOR).max(1);
    if opts.max_width > 2 * margin && opts.max_height > 2 * margin {
        margin
    } else {
        0
    }
}

fn frame(image: &Bitmap, margin: u32, background: Rgba8Premul) -> CarResult<Bitmap> {
    let width = image.width + 2 * margin;
    let height = image.height + 2 * margin;
    let mut out = alloc_bytes(rgba_len(width, height)?)?;
    let bg = background.to_array();
    for px in out.chunks_exact_mut(4) {
        px.copy_from_slice(&bg);
    }
    let row = image.width as usize * 4;
    for y in 0..image.height as usize {
        let dst = ((y + margin as usize) * width as usize + margin as usize) * 4;
        out[dst..dst + row].copy_from_slice(&image.rgba8_premul[y * row..(y + 1) * row]);
    }
    Bitmap::new(width, height, out)
}

fn over_background(image: &Bitmap, background: Rgba8Premul) -> CarResult<Bitmap> {
    let mut out = alloc_bytes(image.rgba8_premul.len())?;
    let bg = background.to_array();
    for (dst, src) in out
        .chunks_exact_mut(4)
        .zip(image.rgba8_premul.chunks_exact(4))
    {
        dst.copy_from_slice(&over(bg, [src[0], src[1], src[2], src[3]], 1.0));
    }
    Bitmap::new(image.width, image.height, out)
}

/// Largest size within `max_w x max_h` keeping the aspect ratio; never larger than the input.
pub(crate) fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let fit = (f64::from(max_w) / f64::from(width))
        .min(f64::from(max_h) / f64::from(height))
        .min(1.0);
    let w = (f64::from(width) * fit).round().max(1.0) as u32;
    let h = (f64::from(height) * fit).round().max(1.0) as u32;
    (w.min(max_w), h.min(max_h))
}

#[cfg(test)]
#[path = "../../tests/unit/render/preview.rs"]
mod tests;
