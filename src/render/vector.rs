use crate::foundation::core::Bitmap;
use crate::foundation::error::{CarError, CarResult};
use crate::rendition::model::{VectorDocument, VectorFormat};

/// Largest raster edge produced from a vector document.
const MAX_DIM: u32 = 16_384;

/// Rasterize a vector document at `scale` pixels per point.
///
/// SVG goes through `usvg`/`resvg`. PDF documents are reported as unsupported.
pub fn rasterize_vector(doc: &VectorDocument, scale: f64) -> CarResult<Bitmap> {
    match doc.format {
        VectorFormat::Svg => {
            let opts = usvg::Options::default();
            let tree = usvg::Tree::from_data(&doc.bytes, &opts)
                .map_err(|e| CarError::invalid_format(format!("parse svg tree: {e}")))?;
            let (width, height) = svg_raster_size(&tree, scale)?;
            let data = rasterize_svg_to_premul_rgba8(&tree, width, height)?;
            Bitmap::new(width, height, data)
        }
        VectorFormat::Pdf => Err(CarError::unsupported("PDF rasterization")),
    }
}

fn svg_raster_size(tree: &usvg::Tree, scale: f64) -> CarResult<(u32, u32)> {
    fn to_px(v: f32, scale: f64) -> CarResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(CarError::invalid_format("svg has invalid width/height"));
        }
        Ok((f64::from(v) * scale).ceil().max(1.0) as u32)
    }

    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };
    let size = tree.size();
    let w = to_px(size.width(), scale)?;
    let h = to_px(size.height(), scale)?;
    if w > MAX_DIM || h > MAX_DIM {
        return Err(CarError::out_of_memory(format!(
            "svg raster size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    Ok((w, h))
}

fn rasterize_svg_to_premul_rgba8(tree: &usvg::Tree, width: u32, height: u32) -> CarResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| CarError::out_of_memory("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.take())
}

#[cfg(test)]
#[path = "../../tests/unit/render/vector.rs"]
mod tests;
