use crate::foundation::core::{Bitmap, alloc_bytes, rgba_len};
use crate::foundation::error::{CarError, CarResult};
use crate::foundation::math::mul_div255_u8;
use crate::rendition::model::LayerImage;

pub type PremulRgba8 = [u8; 4];

/// Layer blend mode, CoreGraphics numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum BlendMode {
    /// Source over.
    Normal,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
    /// Overlay.
    Overlay,
    /// Darken.
    Darken,
    /// Lighten.
    Lighten,
    /// Clear the destination under the source.
    Clear,
    /// Replace the destination.
    Copy,
    /// Saturating add.
    PlusLighter,
    /// Mode not implemented here; composited as [`BlendMode::Normal`].
    Other(i32),
}

impl BlendMode {
    /// Map a stored blend mode.
    pub fn new(raw: i32) -> Self {
        match raw {
            0 => Self::Normal,
            1 => Self::Multiply,
            2 => Self::Screen,
            3 => Self::Overlay,
            4 => Self::Darken,
            5 => Self::Lighten,
            16 => Self::Clear,
            17 => Self::Copy,
            27 => Self::PlusLighter,
            x => Self::Other(x),
        }
    }
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

fn separable(mode: BlendMode, cb: f32, cs: f32) -> f32 {
    match mode {
        BlendMode::Multiply => cb * cs,
        BlendMode::Screen => cb + cs - cb * cs,
        BlendMode::Overlay => {
            if cb <= 0.5 {
                2.0 * cb * cs
            } else {
                1.0 - 2.0 * (1.0 - cb) * (1.0 - cs)
            }
        }
        BlendMode::Darken => cb.min(cs),
        BlendMode::Lighten => cb.max(cs),
        _ => cs,
    }
}

/// Blend one premultiplied source pixel onto a destination pixel.
pub fn blend(dst: PremulRgba8, src: PremulRgba8, mode: BlendMode, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    match mode {
        BlendMode::Normal | BlendMode::Other(_) => return over(dst, src, opacity),
        _ if opacity <= 0.0 => return dst,
        _ => {}
    }

    let f = |v: u8| f32::from(v) / 255.0;
    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    let s = [f(src[0]), f(src[1]), f(src[2]), f(src[3])].map(|c| c * opacity);
    let d = [f(dst[0]), f(dst[1]), f(dst[2]), f(dst[3])];
    let (sa, da) = (s[3], d[3]);

    let mut out = [0.0f32; 4];
    match mode {
        BlendMode::Clear => {
            for i in 0..4 {
                out[i] = d[i] * (1.0 - sa);
            }
        }
        BlendMode::Copy => {
            let raw = [f(src[0]), f(src[1]), f(src[2]), f(src[3])];
            for i in 0..4 {
                out[i] = raw[i] * opacity + d[i] * (1.0 - opacity);
            }
        }
        BlendMode::PlusLighter => {
            for i in 0..4 {
                out[i] = (s[i] + d[i]).min(1.0);
            }
        }
        _ => {
            for i in 0..3 {
                let cs = if sa > 0.0 { s[i] / sa } else { 0.0 };
                let cb = if da > 0.0 { d[i] / da } else { 0.0 };
                out[i] =
                    s[i] * (1.0 - da) + d[i] * (1.0 - sa) + sa * da * separable(mode, cb, cs);
            }
            out[3] = sa + da - sa * da;
        }
    }
    out.map(to_u8)
}

/// Composite layers in declared order onto a transparent `width x height` canvas.
///
/// Each layer image is resampled to its frame size when they differ, then placed at the frame
/// origin (rounded to whole pixels) and clipped to the canvas.
pub fn flatten_layers(width: u32, height: u32, layers: &[LayerImage]) -> CarResult<Bitmap> {
    let mut canvas = alloc_bytes(rgba_len(width, height)?)?;
    for layer in layers {
        let mode = BlendMode::new(layer.blend_mode);
        if let BlendMode::Other(raw) = mode {
            tracing::warn!(blend_mode = raw, "unknown blend mode, compositing as normal");
        }
        let src = fit_to_frame(&layer.image.image, layer)?;
        let x0 = layer.frame.x0.round() as i64;
        let y0 = layer.frame.y0.round() as i64;
        for sy in 0..src.height as i64 {
            let dy = y0 + sy;
            if dy < 0 || dy >= i64::from(height) {
                continue;
            }
            for sx in 0..src.width as i64 {
                let dx = x0 + sx;
                if dx < 0 || dx >= i64::from(width) {
                    continue;
                }
                let si = ((sy * i64::from(src.width) + sx) * 4) as usize;
                let di = ((dy * i64::from(width) + dx) * 4) as usize;
                let s = [
                    src.rgba8_premul[si],
                    src.rgba8_premul[si + 1],
                    src.rgba8_premul[si + 2],
                    src.rgba8_premul[si + 3],
                ];
                let d = [canvas[di], canvas[di + 1], canvas[di + 2], canvas[di + 3]];
                canvas[di..di + 4].copy_from_slice(&blend(d, s, mode, layer.opacity));
            }
        }
    }
    Bitmap::new(width, height, canvas)
}

fn fit_to_frame(image: &Bitmap, layer: &LayerImage) -> CarResult<Bitmap> {
    let fw = layer.frame.width().round();
    let fh = layer.frame.height().round();
    if fw < 1.0 || fh < 1.0 || (fw as u32 == image.width && fh as u32 == image.height) {
        return Ok(image.clone());
    }
    if image.width == 0 || image.height == 0 {
        return Ok(image.clone());
    }
    const MAX_DIM: f64 = 16_384.0;
    if fw > MAX_DIM || fh > MAX_DIM {
        return Err(CarError::invalid_format(format!(
            "layer frame {fw}x{fh} too large (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    let buf = image::RgbaImage::from_raw(image.width, image.height, image.rgba8_premul.to_vec())
        .ok_or_else(|| CarError::invalid_format("layer bitmap length mismatch"))?;
    let resized = image::imageops::resize(
        &buf,
        fw as u32,
        fh as u32,
        image::imageops::FilterType::Triangle,
    );
    Bitmap::new(resized.width(), resized.height(), resized.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
