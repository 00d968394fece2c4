use crate::export::naming;
use crate::foundation::core::Bitmap;
use crate::foundation::error::{CarError, CarResult};
use crate::key::rendition_key::RenditionKey;
use crate::render::preview::{PreviewOpts, render_preview};
use crate::render::vector::rasterize_vector;
use crate::rendition::model::{Rendition, RenditionKind};

/// What a consumer receives for one rendition.
///
/// Mirrors the per-rendition dictionary of the classic catalog browsers: a filename to write,
/// a display name, a one-line description, and the image and/or raw data to show or save.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedLookup {
    /// Output filename, see [`naming::file_name`].
    pub filename: String,
    /// Facet name.
    pub display_name: String,
    /// Kind, dimensions and classification in one line.
    pub description: String,
    /// Image to show: the decoded raster, a color swatch or a rasterized SVG.
    pub image: Option<Bitmap>,
    /// Uniform type identifier of `data`.
    pub uti_type: Option<String>,
    /// Raw bytes to save as-is (data blobs, vector documents, recognition objects).
    pub data: Option<Vec<u8>>,
    /// Image belongs to a multisize set.
    pub is_multisize_image: bool,
}

pub(crate) fn build_lookup(
    key: &RenditionKey,
    rendition: Result<&Rendition, &CarError>,
    preview: Option<&PreviewOpts>,
) -> NamedLookup {
    let rendition = match rendition {
        Ok(rendition) => rendition,
        Err(e) => {
            return NamedLookup {
                filename: naming::file_name(key, None),
                display_name: key.name.clone(),
                description: format!("{}: {e}", key.rendition_name),
                image: None,
                uti_type: None,
                data: None,
                is_multisize_image: false,
            };
        }
    };

    let kind = &rendition.kind;
    let mut image = lookup_image(kind, preview);
    if let (Some(bitmap), Some(opts)) = (&image, preview) {
        image = match render_preview(bitmap, opts) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(name = %key.rendition_name, error = %e, "preview failed");
                None
            }
        };
    }
    let (uti_type, data) = match kind {
        RenditionKind::Data { uti_type, bytes } => (uti_type.clone(), Some(bytes.clone())),
        RenditionKind::VectorImage(v) => (None, Some(v.document.bytes.clone())),
        RenditionKind::RecognitionObject { object_data, .. } => (None, Some(object_data.clone())),
        _ => (None, None),
    };

    NamedLookup {
        filename: naming::file_name(key, Some(kind)),
        display_name: key.name.clone(),
        description: describe(key, kind),
        image,
        uti_type,
        data,
        is_multisize_image: matches!(kind, RenditionKind::MultisizeImage { .. }),
    }
}

fn lookup_image(kind: &RenditionKind, preview: Option<&PreviewOpts>) -> Option<Bitmap> {
    let attempt: CarResult<Option<Bitmap>> = match kind {
        RenditionKind::LayerStack(stack) => Ok(Some(stack.flattened.clone())),
        RenditionKind::Color(named) => match &named.color {
            Some(color) => {
                let opts = preview.copied().unwrap_or_default();
                color.swatch(opts.max_width, opts.max_height).map(Some)
            }
            None => Ok(None),
        },
        RenditionKind::VectorImage(v) => rasterize_vector(&v.document, v.scale).map(Some),
        other => Ok(other.image().map(|named| named.image.clone())),
    };
    attempt.unwrap_or_else(|e| {
        tracing::debug!(kind = kind.label(), error = %e, "no lookup image");
        None
    })
}

fn describe(key: &RenditionKey, kind: &RenditionKind) -> String {
    let detail = match kind {
        RenditionKind::Image(img)
        | RenditionKind::MultisizeImage { image: img, .. }
        | RenditionKind::RecognitionImage { image: img, .. } => {
            format!("{}x{} @{}x", img.width, img.height, img.scale)
        }
        RenditionKind::LayerStack(stack) => format!(
            "{}x{}, {} layers",
            stack.size.width,
            stack.size.height,
            stack.layers.len()
        ),
        RenditionKind::ImageAtlas(atlas) => format!(
            "{}x{}, {} slices",
            atlas.image.width,
            atlas.image.height,
            atlas.images.len()
        ),
        RenditionKind::Data { uti_type, bytes } => match uti_type {
            Some(uti) => format!("{} bytes {uti}", bytes.len()),
            None => format!("{} bytes", bytes.len()),
        },
        RenditionKind::ExternalLink {
            asset_pack_identifier,
        } => asset_pack_identifier.clone(),
        RenditionKind::Texture(t) => format!("{}x{} @{}x", t.width, t.height, t.scale),
        RenditionKind::Color(named) => match (&named.system_color_name, &named.color) {
            (Some(name), _) => name.clone(),
            (None, Some(color)) => {
                let [r, g, b, a] = color.rgba();
                format!("{:?} {r:.3} {g:.3} {b:.3} {a:.3}", color.color_space)
            }
            (None, None) => String::new(),
        },
        RenditionKind::VectorImage(v) => {
            format!("{:?} {} bytes", v.document.format, v.document.bytes.len())
        }
        RenditionKind::RecognitionGroup(g) => format!(
            "{} items, {} images, {} objects",
            g.items.len(),
            g.images.len(),
            g.objects.len()
        ),
        RenditionKind::RecognitionObject {
            version,
            object_data,
        } => format!("v{version}, {} bytes", object_data.len()),
        RenditionKind::MultisizeImageSet { sizes } => {
            let sizes: Vec<String> = sizes
                .iter()
                .map(|s| format!("{}x{}", s.width, s.height))
                .collect();
            sizes.join(", ")
        }
        RenditionKind::Model => String::new(),
    };
    [kind.label().to_string(), detail, key.summary()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "../../tests/unit/enumerate/lookup.rs"]
mod tests;
