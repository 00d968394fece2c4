//! Payload decoding, dispatched on the rendition layout tag.

use crate::container::catalog::{Container, IndexEntry};
use crate::foundation::bytes::{ByteReader, fourcc};
use crate::foundation::core::Size;
use crate::foundation::error::{CarError, CarResult};
use crate::key::attributes::Idiom;
use crate::key::rendition_key::RenditionKey;
use crate::render::composite::flatten_layers;
use crate::rendition::color::decode_color;
use crate::rendition::csi::{CsiRecord, LayoutType, PixelFormat};
use crate::rendition::layers::read_layer_stack;
use crate::rendition::model::{
    ImageAtlas, LayerImage, LayerStack, MultisizeIndex, NamedImage, NamedVectorImage,
    RecognitionGroup, Rendition, RenditionKind, TextureInfo, VectorDocument, VectorFormat,
};
use crate::rendition::pixels::{RAWD_TAG, decode_bitmap, read_rawd};

const MULTISIZE_TAG: u32 = fourcc(b"SISM");
const INTERNAL_LINK_TAG: u32 = fourcc(b"INLK");
const RECOGNITION_GROUP_TAG: u32 = fourcc(b"RGRP");

/// Decode the payload of one index entry.
///
/// Pure with respect to the container: decoding the same entry twice yields equal renditions.
pub(crate) fn decode(container: &Container, entry: &IndexEntry<'_>) -> CarResult<Rendition> {
    let record = CsiRecord::parse(entry.record)?;
    let kind = decode_kind(container, entry, &record)?;
    Ok(Rendition {
        key: entry.key.clone(),
        kind,
    })
}

fn decode_kind(
    container: &Container,
    entry: &IndexEntry<'_>,
    rec: &CsiRecord<'_>,
) -> CarResult<RenditionKind> {
    let h = &rec.header;
    let props = &rec.properties;
    match h.layout {
        LayoutType::Image(_) | LayoutType::TextureImage => {
            let image = decode_image(container, rec)?;
            Ok(with_multisize(container, &entry.key, image))
        }
        LayoutType::InternalReference => Ok(RenditionKind::Image(decode_image(container, rec)?)),
        LayoutType::PackedImage => decode_atlas(container, entry, rec),
        LayoutType::RecognitionImage => {
            let image = decode_image(container, rec)?;
            let (pw, ph) = props.physical_size.unwrap_or((0.0, 0.0));
            Ok(RenditionKind::RecognitionImage {
                image,
                physical_size_meters: Size::new(pw, ph),
            })
        }
        LayoutType::Vector => decode_vector(entry, rec),
        LayoutType::Data => {
            let bytes = unwrap_rawd(rec.payload)?;
            Ok(RenditionKind::Data {
                uti_type: props.uti.clone(),
                bytes: bytes.to_vec(),
            })
        }
        LayoutType::ExternalLink => {
            let asset_pack_identifier = props.external_tags.clone().ok_or_else(|| {
                CarError::invalid_format(format!("external link {:?} has no identifier", h.name))
            })?;
            Ok(RenditionKind::ExternalLink {
                asset_pack_identifier,
            })
        }
        LayoutType::LayerStack => decode_layer_stack(container, rec),
        LayoutType::Texture => Ok(RenditionKind::Texture(TextureInfo {
            width: h.width,
            height: h.height,
            scale: h.scale(),
            exif_orientation: props.exif_orientation,
            is_opaque: h.is_opaque(),
            is_alpha_cropped: props.metrics.is_some_and(|m| m.is_alpha_cropped()),
        })),
        LayoutType::Color => Ok(RenditionKind::Color(decode_color(rec.payload)?)),
        LayoutType::MultisizeImageSet => Ok(RenditionKind::MultisizeImageSet {
            sizes: read_multisize_set(rec.payload)?,
        }),
        LayoutType::Model => Ok(RenditionKind::Model),
        LayoutType::RecognitionObject => {
            let (version, data) = read_rawd(rec.payload)?;
            Ok(RenditionKind::RecognitionObject {
                version,
                object_data: data.to_vec(),
            })
        }
        LayoutType::RecognitionGroup => Ok(RenditionKind::RecognitionGroup(
            read_recognition_group(rec.payload)?,
        )),
        LayoutType::Other(raw) => Err(CarError::unsupported(format!(
            "layout {raw} for {:?}",
            h.name
        ))),
    }
}

/// Decode an image-bearing record into pixels, following atlas references.
fn decode_image(container: &Container, rec: &CsiRecord<'_>) -> CarResult<NamedImage> {
    let h = &rec.header;
    let max = container.opts().max_bitmap_bytes;
    match h.layout {
        LayoutType::InternalReference => {
            let target_tokens = read_internal_link(rec.payload)?;
            let (x, y, w, hgt) = rec.properties.frame.ok_or_else(|| {
                CarError::invalid_format(format!("internal reference {:?} has no frame", h.name))
            })?;
            let target = container.entry_by_tokens(&target_tokens)?.ok_or_else(|| {
                CarError::invalid_format(format!(
                    "internal reference {:?} points at a missing rendition",
                    h.name
                ))
            })?;
            let atlas = CsiRecord::parse(target.record)?;
            if atlas.header.layout == LayoutType::InternalReference {
                return Err(CarError::invalid_format(format!(
                    "internal reference {:?} points at another reference",
                    h.name
                )));
            }
            let pixels = decode_bitmap(
                atlas.payload,
                atlas.header.pixel_format,
                atlas.header.width,
                atlas.header.height,
                max,
            )?;
            let x = u32::try_from(x)
                .map_err(|_| CarError::invalid_format(format!("negative atlas frame x {x}")))?;
            let y = u32::try_from(y)
                .map_err(|_| CarError::invalid_format(format!("negative atlas frame y {y}")))?;
            Ok(NamedImage::new(pixels.crop(x, y, w, hgt)?, h.scale()))
        }
        LayoutType::Image(_)
        | LayoutType::TextureImage
        | LayoutType::PackedImage
        | LayoutType::RecognitionImage => {
            let pixels = decode_bitmap(rec.payload, h.pixel_format, h.width, h.height, max)?;
            Ok(NamedImage::new(pixels, h.scale()))
        }
        other => Err(CarError::unsupported(format!(
            "layout {} does not carry an image",
            other.value()
        ))),
    }
}

fn with_multisize(container: &Container, key: &RenditionKey, image: NamedImage) -> RenditionKind {
    let Some(sizes) = container.side_tables().multisize_sets.get(&key.name) else {
        return RenditionKind::Image(image);
    };
    let point = image.point_size();
    let next_size_smaller = sizes
        .iter()
        .filter(|s| f64::from(s.width) < point.width)
        .max_by_key(|s| s.width)
        .map(|s| Size::new(f64::from(s.width), f64::from(s.height)))
        .unwrap_or(Size::ZERO);
    RenditionKind::MultisizeImage {
        image,
        next_size_smaller,
    }
}

fn decode_atlas(
    container: &Container,
    entry: &IndexEntry<'_>,
    rec: &CsiRecord<'_>,
) -> CarResult<RenditionKind> {
    let image = decode_image(container, rec)?;
    let mut images = Vec::new();
    let mut image_names = Vec::new();
    if let Some(members) = container.side_tables().atlas_members.get(&entry.tokens) {
        for member in members {
            let (x, y, w, h) = member.frame;
            let crop = u32::try_from(x)
                .ok()
                .zip(u32::try_from(y).ok())
                .ok_or_else(|| CarError::invalid_format("negative atlas frame"))
                .and_then(|(x, y)| image.image.crop(x, y, w, h));
            match crop {
                Ok(bitmap) => {
                    images.push(NamedImage::new(bitmap, image.scale));
                    image_names.push(member.rendition_name.clone());
                }
                Err(e) => tracing::warn!(
                    member = %member.rendition_name,
                    error = %e,
                    "atlas member outside atlas bounds"
                ),
            }
        }
    }
    Ok(RenditionKind::ImageAtlas(ImageAtlas {
        scale: image.scale,
        complete_texture_extrusion: rec.header.complete_texture_extrusion(),
        image,
        images,
        image_names,
    }))
}

fn decode_vector(entry: &IndexEntry<'_>, rec: &CsiRecord<'_>) -> CarResult<RenditionKind> {
    let bytes = unwrap_rawd(rec.payload)?;
    let format = match rec.header.pixel_format {
        PixelFormat::Pdf => VectorFormat::Pdf,
        PixelFormat::Svg => VectorFormat::Svg,
        _ if bytes.starts_with(b"%PDF") => VectorFormat::Pdf,
        _ if bytes.windows(4).any(|w| w == b"<svg") => VectorFormat::Svg,
        other => {
            return Err(CarError::unsupported(format!(
                "vector format {}",
                other.code()
            )));
        }
    };
    Ok(RenditionKind::VectorImage(NamedVectorImage {
        document: VectorDocument {
            format,
            bytes: bytes.to_vec(),
        },
        scale: rec.header.scale(),
        layout_direction: entry.key.direction,
    }))
}

fn decode_layer_stack(container: &Container, rec: &CsiRecord<'_>) -> CarResult<RenditionKind> {
    let stack = read_layer_stack(rec.payload)?;
    let resolve = |tokens: &[u16]| -> CarResult<NamedImage> {
        let target = container.entry_by_tokens(tokens)?.ok_or_else(|| {
            CarError::invalid_format(format!(
                "layer stack {:?} references a missing rendition",
                rec.header.name
            ))
        })?;
        decode_image(container, &CsiRecord::parse(target.record)?)
    };

    let mut layers = Vec::with_capacity(stack.layers.len());
    for layer in &stack.layers {
        layers.push(LayerImage {
            image: resolve(&layer.target)?,
            frame: layer.frame,
            opacity: layer.opacity,
            blend_mode: layer.blend_mode,
            fixed_frame: layer.fixed_frame,
        });
    }
    let radiosity = stack.radiosity.as_deref().map(resolve).transpose()?;
    let (width, height) = (rec.header.width, rec.header.height);
    let flattened = flatten_layers(width, height, &layers)?;
    Ok(RenditionKind::LayerStack(LayerStack {
        layers,
        flattened,
        radiosity,
        size: Size::new(f64::from(width), f64::from(height)),
    }))
}

/// Payload bytes, unwrapping a `RAWD` chunk when present.
fn unwrap_rawd(payload: &[u8]) -> CarResult<&[u8]> {
    let is_rawd = payload
        .first_chunk::<4>()
        .is_some_and(|tag| u32::from_le_bytes(*tag) == RAWD_TAG);
    if is_rawd {
        Ok(read_rawd(payload)?.1)
    } else {
        Ok(payload)
    }
}

pub(crate) fn read_multisize_set(payload: &[u8]) -> CarResult<Vec<MultisizeIndex>> {
    let mut r = ByteReader::new(payload, "multisize set");
    let tag = r.u32_le()?;
    if tag != MULTISIZE_TAG {
        return Err(CarError::invalid_format(format!(
            "multisize set tag {tag:#010x} is not SISM"
        )));
    }
    let _version = r.u32_le()?;
    let count = r.u32_le()? as usize;
    if count > r.remaining() / 12 {
        return Err(CarError::invalid_format(format!(
            "multisize set declares {count} sizes past its end"
        )));
    }
    let mut sizes = Vec::with_capacity(count);
    for _ in 0..count {
        sizes.push(MultisizeIndex {
            width: r.u32_le()?,
            height: r.u32_le()?,
            index: r.u16_le()?,
            idiom: Idiom::new(r.u16_le()?),
        });
    }
    Ok(sizes)
}

/// Key tokens of the atlas an internal reference points at.
pub(crate) fn read_internal_link(payload: &[u8]) -> CarResult<Vec<u16>> {
    let mut r = ByteReader::new(payload, "internal link");
    let tag = r.u32_le()?;
    if tag != INTERNAL_LINK_TAG {
        return Err(CarError::invalid_format(format!(
            "internal link tag {tag:#010x} is not INLK"
        )));
    }
    let _version = r.u32_le()?;
    let _target_layout = r.u16_le()?;
    let _pad = r.u16_le()?;
    let len = r.u32_le()? as usize;
    if len % 2 != 0 || len > r.remaining() {
        return Err(CarError::invalid_format(format!(
            "internal link key of {len} bytes does not fit"
        )));
    }
    (0..len / 2).map(|_| r.u16_le()).collect()
}

fn read_recognition_group(payload: &[u8]) -> CarResult<RecognitionGroup> {
    let mut r = ByteReader::new(payload, "recognition group");
    let tag = r.u32_le()?;
    if tag != RECOGNITION_GROUP_TAG {
        return Err(CarError::invalid_format(format!(
            "recognition group tag {tag:#010x} is not RGRP"
        )));
    }
    let _version = r.u32_le()?;
    fn read_names(r: &mut ByteReader<'_>) -> CarResult<Vec<String>> {
        let count = r.u32_le()? as usize;
        if count > r.remaining() / 4 {
            return Err(CarError::invalid_format(format!(
                "recognition group declares {count} names past its end"
            )));
        }
        (0..count)
            .map(|_| {
                let len = r.u32_le()? as usize;
                r.fixed_str(len)
            })
            .collect()
    }
    Ok(RecognitionGroup {
        items: read_names(&mut r)?,
        images: read_names(&mut r)?,
        objects: read_names(&mut r)?,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/rendition/decode.rs"]
mod tests;
