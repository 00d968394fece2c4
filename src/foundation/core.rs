use std::sync::Arc;

use crate::foundation::error::{CarError, CarResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

pub use kurbo::{Rect, Size};

/// Premultiplied RGBA8 color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Rgba8Premul {
    /// Red channel, premultiplied by alpha.
    pub r: u8,
    /// Green channel, premultiplied by alpha.
    pub g: u8,
    /// Blue channel, premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Premultiply a straight-alpha color.
    pub fn from_straight(r: u8, g: u8, b: u8, a: u8) -> Self {
        let mut px = [r, g, b, a];
        premultiply_rgba8_in_place(&mut px);
        Self {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        }
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Decoded raster in row-major premultiplied RGBA8.
///
/// Pixel storage is reference counted so cloning a bitmap into a lookup or a layer list does not
/// copy pixels. Bitmaps never borrow from container buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes, `width * height * 4` long.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl Bitmap {
    /// Wrap premultiplied RGBA8 bytes, checking the buffer length.
    pub fn new(width: u32, height: u32, rgba8_premul: Vec<u8>) -> CarResult<Self> {
        let expected = rgba_len(width, height)?;
        if rgba8_premul.len() != expected {
            return Err(CarError::invalid_format(format!(
                "bitmap {width}x{height} expects {expected} bytes, got {}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Solid-color bitmap.
    pub fn filled(width: u32, height: u32, color: Rgba8Premul) -> CarResult<Self> {
        let len = rgba_len(width, height)?;
        let mut data = alloc_bytes(len)?;
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&color.to_array());
        }
        Self::new(width, height, data)
    }

    /// Premultiply a straight-alpha `image` buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut data = img.into_raw();
        premultiply_rgba8_in_place(&mut data);
        Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        }
    }

    /// Straight-alpha copy suitable for PNG encoding.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut data = self.rgba8_premul.as_ref().clone();
        unpremultiply_rgba8_in_place(&mut data);
        image::RgbaImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.rgba8_premul.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// `true` when every pixel has full alpha.
    pub fn is_opaque(&self) -> bool {
        self.rgba8_premul.chunks_exact(4).all(|px| px[3] == 255)
    }

    /// Copy out the `w x h` region at `(x, y)`.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> CarResult<Self> {
        let fits = x.checked_add(w).is_some_and(|r| r <= self.width)
            && y.checked_add(h).is_some_and(|b| b <= self.height);
        if !fits {
            return Err(CarError::invalid_format(format!(
                "crop {w}x{h}+{x}+{y} outside {}x{} bitmap",
                self.width, self.height
            )));
        }
        let mut out = alloc_bytes(rgba_len(w, h)?)?;
        let src_stride = self.width as usize * 4;
        let row_len = w as usize * 4;
        for row in 0..h as usize {
            let src = (y as usize + row) * src_stride + x as usize * 4;
            let dst = row * row_len;
            out[dst..dst + row_len].copy_from_slice(&self.rgba8_premul[src..src + row_len]);
        }
        Self::new(w, h, out)
    }
}

/// Byte length of a `width x height` RGBA8 buffer, rejecting overflow.
pub(crate) fn rgba_len(width: u32, height: u32) -> CarResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| CarError::out_of_memory(format!("bitmap size overflow: {width}x{height}")))
}

/// Zeroed buffer whose reservation failure surfaces as [`CarError::OutOfMemory`].
pub(crate) fn alloc_bytes(len: usize) -> CarResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|e| CarError::out_of_memory(format!("reserve {len} bytes: {e}")))?;
    buf.resize(len, 0);
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
