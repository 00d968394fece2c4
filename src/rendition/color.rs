use serde::Serialize;

use crate::foundation::bytes::{ByteReader, fourcc};
use crate::foundation::core::{Bitmap, Rgba8Premul};
use crate::foundation::error::{CarError, CarResult};
use crate::rendition::model::NamedColor;

const COLOR_TAG: u32 = fourcc(b"COLR");
const SYSTEM_COLOR_FLAG: u32 = 1 << 8;
const MAX_COMPONENTS: usize = 16;

/// Color space of a stored color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ColorSpace {
    /// sRGB.
    Srgb,
    /// Gray, gamma 2.2.
    GrayGamma22,
    /// Display P3.
    DisplayP3,
    /// Extended-range sRGB.
    ExtendedRangeSrgb,
    /// Extended linear sRGB.
    ExtendedLinearSrgb,
    /// Extended-range gray.
    ExtendedGray,
    /// Identifier not known to this crate.
    Other(u8),
}

impl ColorSpace {
    /// Map an on-disk identifier.
    pub fn new(raw: u8) -> Self {
        match raw {
            0 => Self::Srgb,
            1 => Self::GrayGamma22,
            2 => Self::DisplayP3,
            3 => Self::ExtendedRangeSrgb,
            4 => Self::ExtendedLinearSrgb,
            5 => Self::ExtendedGray,
            x => Self::Other(x),
        }
    }
}

/// Color components as stored, in the record's color space.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeviceColor {
    /// Component color space.
    pub color_space: ColorSpace,
    /// Components, alpha last.
    pub components: Vec<f64>,
}

impl DeviceColor {
    /// Straight-alpha `[r, g, b, a]` in `0..=1`.
    ///
    /// One or two components read as gray (plus alpha); three as RGB; four or more as RGBA.
    /// Components are clamped, so extended-range values saturate. No gamut conversion is done.
    pub fn rgba(&self) -> [f64; 4] {
        let c = |i: usize| self.components.get(i).copied().unwrap_or(0.0).clamp(0.0, 1.0);
        match self.components.len() {
            0 => [0.0, 0.0, 0.0, 0.0],
            1 => [c(0), c(0), c(0), 1.0],
            2 => [c(0), c(0), c(0), c(1)],
            3 => [c(0), c(1), c(2), 1.0],
            _ => [c(0), c(1), c(2), c(3)],
        }
    }

    /// Premultiplied 8-bit version of [`DeviceColor::rgba`].
    pub fn to_rgba8_premul(&self) -> Rgba8Premul {
        let to_u8 = |v: f64| (v * 255.0).round() as u8;
        let [r, g, b, a] = self.rgba();
        Rgba8Premul::from_straight(to_u8(r), to_u8(g), to_u8(b), to_u8(a))
    }

    /// Solid swatch of the color, used as the image of a color rendition.
    pub fn swatch(&self, width: u32, height: u32) -> CarResult<Bitmap> {
        Bitmap::filled(width, height, self.to_rgba8_premul())
    }
}

pub(crate) fn decode_color(payload: &[u8]) -> CarResult<NamedColor> {
    let mut r = ByteReader::new(payload, "color record");
    let tag = r.u32_le()?;
    if tag != COLOR_TAG {
        return Err(CarError::invalid_format(format!(
            "color record tag {tag:#010x} is not COLR"
        )));
    }
    let _version = r.u32_le()?;
    let flags = r.u32_le()?;
    let count = r.u32_le()? as usize;
    if count > MAX_COMPONENTS || count > r.remaining() / 8 {
        return Err(CarError::invalid_format(format!(
            "color record declares {count} components"
        )));
    }
    let mut components = Vec::with_capacity(count);
    for _ in 0..count {
        components.push(r.f64_le()?);
    }

    if flags & SYSTEM_COLOR_FLAG != 0 {
        let len = r.u32_le()? as usize;
        return Ok(NamedColor {
            color: None,
            system_color_name: Some(r.fixed_str(len)?),
        });
    }

    Ok(NamedColor {
        color: Some(DeviceColor {
            color_space: ColorSpace::new((flags & 0xff) as u8),
            components,
        }),
        system_color_name: None,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/rendition/color.rs"]
mod tests;
