use serde::Serialize;

use crate::foundation::core::{Bitmap, Rect, Size};
use crate::key::attributes::Idiom;
use crate::key::rendition_key::RenditionKey;
use crate::rendition::color::DeviceColor;

/// One decoded rendition: classification key plus typed payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Rendition {
    /// Classification key.
    pub key: RenditionKey,
    /// Decoded payload.
    pub kind: RenditionKind,
}

/// Raster image with its device scale.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedImage {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Device scale factor.
    pub scale: f64,
    /// Premultiplied pixels.
    pub image: Bitmap,
}

impl NamedImage {
    pub(crate) fn new(image: Bitmap, scale: f64) -> Self {
        Self {
            width: image.width,
            height: image.height,
            scale,
            image,
        }
    }

    /// Size in points (`pixels / scale`).
    pub fn point_size(&self) -> Size {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        Size::new(
            f64::from(self.width) / scale,
            f64::from(self.height) / scale,
        )
    }
}

/// One positioned layer of a [`LayerStack`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayerImage {
    /// Layer pixels.
    pub image: NamedImage,
    /// Placement on the stack canvas.
    pub frame: Rect,
    /// Layer opacity in `0..=1`.
    pub opacity: f32,
    /// Blend mode, CoreGraphics numbering.
    pub blend_mode: i32,
    /// Layer keeps its frame when the stack is resized.
    pub fixed_frame: bool,
}

/// Layered image and its flattened composite.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerStack {
    /// Layers, bottom first.
    pub layers: Vec<LayerImage>,
    /// Layers composited in order onto a transparent canvas of `size`.
    pub flattened: Bitmap,
    /// Precomputed radiosity image, copied from its referenced rendition.
    pub radiosity: Option<NamedImage>,
    /// Canvas size in pixels.
    pub size: Size,
}

/// Packed atlas and the slices that reference it.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageAtlas {
    /// Whole atlas.
    pub image: NamedImage,
    /// Member slices, cropped out of the atlas.
    pub images: Vec<NamedImage>,
    /// Rendition names of the members, parallel to `images`.
    pub image_names: Vec<String>,
    /// Atlas scale.
    pub scale: f64,
    /// Texture borders were extruded.
    pub complete_texture_extrusion: bool,
}

/// Texture description (the pixel data lives in texture-image renditions).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TextureInfo {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Device scale factor.
    pub scale: f64,
    /// EXIF orientation tag.
    pub exif_orientation: u32,
    /// Flagged as fully opaque.
    pub is_opaque: bool,
    /// Transparent border was cropped.
    pub is_alpha_cropped: bool,
}

/// Named color; either explicit components or a platform system color.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NamedColor {
    /// Explicit color, absent for system colors.
    pub color: Option<DeviceColor>,
    /// System color name, e.g. `systemBlueColor`.
    pub system_color_name: Option<String>,
}

/// Document format of a vector rendition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VectorFormat {
    /// PDF.
    Pdf,
    /// SVG.
    Svg,
}

/// Vector document bytes, kept opaque until rasterized on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorDocument {
    /// Document format.
    pub format: VectorFormat,
    /// Raw document bytes.
    pub bytes: Vec<u8>,
}

/// Vector rendition.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedVectorImage {
    /// Document.
    pub document: VectorDocument,
    /// Device scale factor.
    pub scale: f64,
    /// Layout direction attribute.
    pub layout_direction: u16,
}

/// AR resource group name lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecognitionGroup {
    /// Item names.
    pub items: Vec<String>,
    /// Reference image names.
    pub images: Vec<String>,
    /// Recognition object names.
    pub objects: Vec<String>,
}

/// One size of a multisize image set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MultisizeIndex {
    /// Point width.
    pub width: u32,
    /// Point height.
    pub height: u32,
    /// Position in the set.
    pub index: u16,
    /// Idiom this size applies to.
    pub idiom: Idiom,
}

/// Closed set of decoded payload kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum RenditionKind {
    /// Raster image.
    Image(NamedImage),
    /// Raster image belonging to a multisize set.
    MultisizeImage {
        /// The image.
        image: NamedImage,
        /// Next smaller size in the set, zero when this is the smallest.
        next_size_smaller: Size,
    },
    /// Opaque data blob.
    Data {
        /// Declared uniform type identifier.
        uti_type: Option<String>,
        /// Blob bytes.
        bytes: Vec<u8>,
    },
    /// Layered image.
    LayerStack(LayerStack),
    /// Packed atlas.
    ImageAtlas(ImageAtlas),
    /// On-demand resource reference.
    ExternalLink {
        /// Asset pack identifier.
        asset_pack_identifier: String,
    },
    /// Texture description.
    Texture(TextureInfo),
    /// Solid color.
    Color(NamedColor),
    /// 3D model (no payload is decoded).
    Model,
    /// Vector document.
    VectorImage(NamedVectorImage),
    /// AR reference image.
    RecognitionImage {
        /// The image.
        image: NamedImage,
        /// Physical size in meters.
        physical_size_meters: Size,
    },
    /// AR resource group.
    RecognitionGroup(RecognitionGroup),
    /// AR recognition object.
    RecognitionObject {
        /// Object format version.
        version: u32,
        /// Serialized object.
        object_data: Vec<u8>,
    },
    /// Size index of a multisize image set.
    MultisizeImageSet {
        /// Sizes, in stored order.
        sizes: Vec<MultisizeIndex>,
    },
}

impl RenditionKind {
    /// Short kind name used in descriptions and listings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Image(_) => "Image",
            Self::MultisizeImage { .. } => "MultisizeImage",
            Self::Data { .. } => "Data",
            Self::LayerStack(_) => "LayerStack",
            Self::ImageAtlas(_) => "ImageAtlas",
            Self::ExternalLink { .. } => "ExternalLink",
            Self::Texture(_) => "Texture",
            Self::Color(_) => "Color",
            Self::Model => "Model",
            Self::VectorImage(_) => "VectorImage",
            Self::RecognitionImage { .. } => "RecognitionImage",
            Self::RecognitionGroup(_) => "RecognitionGroup",
            Self::RecognitionObject { .. } => "RecognitionObject",
            Self::MultisizeImageSet { .. } => "MultisizeImageSet",
        }
    }

    /// Primary raster carried by this kind, if any.
    pub fn image(&self) -> Option<&NamedImage> {
        match self {
            Self::Image(image)
            | Self::MultisizeImage { image, .. }
            | Self::RecognitionImage { image, .. } => Some(image),
            Self::ImageAtlas(atlas) => Some(&atlas.image),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rendition/model.rs"]
mod tests;
