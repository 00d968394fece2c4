use crate::foundation::bytes::{ByteReader, fourcc};
use crate::foundation::core::Rect;
use crate::foundation::error::{CarError, CarResult};

const LAYER_STACK_TAG: u32 = fourcc(b"LAYS");
const MAX_LAYERS: usize = 256;

/// Layer entry as stored: placement plus the key tokens of the image it shows.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LayerRef {
    pub(crate) frame: Rect,
    pub(crate) opacity: f32,
    pub(crate) blend_mode: i32,
    pub(crate) fixed_frame: bool,
    pub(crate) target: Vec<u16>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LayerStackRef {
    pub(crate) radiosity: Option<Vec<u16>>,
    pub(crate) layers: Vec<LayerRef>,
}

fn read_tokens(r: &mut ByteReader<'_>) -> CarResult<Vec<u16>> {
    let len = r.u32_le()? as usize;
    if len % 2 != 0 || len > r.remaining() {
        return Err(CarError::invalid_format(format!(
            "layer key of {len} bytes does not fit"
        )));
    }
    (0..len / 2).map(|_| r.u16_le()).collect()
}

pub(crate) fn read_layer_stack(payload: &[u8]) -> CarResult<LayerStackRef> {
    let mut r = ByteReader::new(payload, "layer stack");
    let tag = r.u32_le()?;
    if tag != LAYER_STACK_TAG {
        return Err(CarError::invalid_format(format!(
            "layer stack tag {tag:#010x} is not LAYS"
        )));
    }
    let _version = r.u32_le()?;
    let count = r.u32_le()? as usize;
    if count > MAX_LAYERS {
        return Err(CarError::invalid_format(format!(
            "layer stack declares {count} layers"
        )));
    }
    let radiosity = read_tokens(&mut r)?;
    let radiosity = (!radiosity.is_empty()).then_some(radiosity);

    let mut layers = Vec::with_capacity(count);
    for _ in 0..count {
        let x = r.f32_le()?;
        let y = r.f32_le()?;
        let w = r.f32_le()?;
        let h = r.f32_le()?;
        let opacity = r.f32_le()?;
        let blend_mode = r.i32_le()?;
        let fixed_frame = r.u32_le()? != 0;
        let target = read_tokens(&mut r)?;
        layers.push(LayerRef {
            frame: Rect::new(
                f64::from(x),
                f64::from(y),
                f64::from(x) + f64::from(w),
                f64::from(y) + f64::from(h),
            ),
            opacity: if opacity.is_finite() {
                opacity.clamp(0.0, 1.0)
            } else {
                1.0
            },
            blend_mode,
            fixed_frame,
            target,
        });
    }
    Ok(LayerStackRef { radiosity, layers })
}

#[cfg(test)]
#[path = "../../tests/unit/rendition/layers.rs"]
mod tests;
