//! Fixed rendition header (`CTSI`) and its trailing TLV properties.

use serde::Serialize;

use crate::foundation::bytes::{ByteReader, c_string, fourcc};
use crate::foundation::error::{CarError, CarResult};

const CSI_TAG: u32 = fourcc(b"CTSI");

/// Size of the fixed header preceding the TLV block.
pub const CSI_HEADER_LEN: usize = 184;

/// Payload kind tag stored in the header metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LayoutType {
    /// One-, three- or nine-part bitmap and other plain image layouts.
    Image(u16),
    /// PDF or SVG document.
    Vector,
    /// Opaque data blob.
    Data,
    /// Reference to an on-demand asset pack.
    ExternalLink,
    /// Layered image.
    LayerStack,
    /// Slice of a packed atlas.
    InternalReference,
    /// Packed atlas.
    PackedImage,
    /// Texture description.
    Texture,
    /// Bitmap member of a texture.
    TextureImage,
    /// Solid color.
    Color,
    /// Size index of a multisize image set.
    MultisizeImageSet,
    /// 3D model.
    Model,
    /// AR recognition object.
    RecognitionObject,
    /// AR reference image.
    RecognitionImage,
    /// AR resource group.
    RecognitionGroup,
    /// Tag not known to this crate.
    Other(u16),
}

impl LayoutType {
    /// Map an on-disk layout tag.
    pub fn new(raw: u16) -> Self {
        match raw {
            10..=12 | 20..=25 | 30..=34 | 40 | 50 => Self::Image(raw),
            9 => Self::Vector,
            1000 => Self::Data,
            1001 => Self::ExternalLink,
            1002 => Self::LayerStack,
            1003 => Self::InternalReference,
            1004 => Self::PackedImage,
            1007 => Self::Texture,
            1008 => Self::TextureImage,
            1009 => Self::Color,
            1010 => Self::MultisizeImageSet,
            1011 => Self::Model,
            1014 => Self::RecognitionObject,
            1015 => Self::RecognitionImage,
            1016 => Self::RecognitionGroup,
            x => Self::Other(x),
        }
    }

    /// On-disk layout tag.
    pub fn value(&self) -> u16 {
        match self {
            Self::Image(x) | Self::Other(x) => *x,
            Self::Vector => 9,
            Self::Data => 1000,
            Self::ExternalLink => 1001,
            Self::LayerStack => 1002,
            Self::InternalReference => 1003,
            Self::PackedImage => 1004,
            Self::Texture => 1007,
            Self::TextureImage => 1008,
            Self::Color => 1009,
            Self::MultisizeImageSet => 1010,
            Self::Model => 1011,
            Self::RecognitionObject => 1014,
            Self::RecognitionImage => 1015,
            Self::RecognitionGroup => 1016,
        }
    }
}

/// Pixel or container format of the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PixelFormat {
    /// Premultiplied 8-bit BGRA in a `CELM` chunk.
    Argb,
    /// 8-bit gray plus alpha in a `CELM` chunk.
    Ga8,
    /// 16-bit gray plus alpha in a `CELM` chunk.
    Ga16,
    /// JPEG file in a `RAWD` chunk.
    Jpeg,
    /// PNG file in a `RAWD` chunk.
    Png,
    /// Encoded image or blob in a `RAWD` chunk.
    Data,
    /// PDF document.
    Pdf,
    /// SVG document.
    Svg,
    /// HEIF image.
    Heif,
    /// No pixel format (non-image renditions) or one not known to this crate.
    Other(u32),
}

impl PixelFormat {
    /// Map an on-disk four-character code.
    pub fn new(raw: u32) -> Self {
        match raw {
            x if x == fourcc(b"ARGB") => Self::Argb,
            x if x == fourcc(b"GA8 ") => Self::Ga8,
            x if x == fourcc(b"GA16") => Self::Ga16,
            x if x == fourcc(b"JPEG") => Self::Jpeg,
            x if x == fourcc(b"PNG ") => Self::Png,
            x if x == fourcc(b"DATA") => Self::Data,
            x if x == fourcc(b"PDF ") => Self::Pdf,
            x if x == fourcc(b"SVG ") => Self::Svg,
            x if x == fourcc(b"HEIF") => Self::Heif,
            x => Self::Other(x),
        }
    }

    /// Four-character code as text; non-printable codes render as hex.
    pub fn code(&self) -> String {
        let raw = match self {
            Self::Argb => fourcc(b"ARGB"),
            Self::Ga8 => fourcc(b"GA8 "),
            Self::Ga16 => fourcc(b"GA16"),
            Self::Jpeg => fourcc(b"JPEG"),
            Self::Png => fourcc(b"PNG "),
            Self::Data => fourcc(b"DATA"),
            Self::Pdf => fourcc(b"PDF "),
            Self::Svg => fourcc(b"SVG "),
            Self::Heif => fourcc(b"HEIF"),
            Self::Other(x) => *x,
        };
        let bytes = raw.to_be_bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            format!("{raw:#010x}")
        }
    }
}

/// Fixed 184-byte rendition header.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CsiHeader {
    /// Header version.
    pub version: u32,
    /// Rendition flags; see [`CsiHeader::is_opaque`].
    pub flags: u32,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Scale factor times 100.
    pub scale_factor: u32,
    /// Payload pixel format.
    pub pixel_format: PixelFormat,
    /// Color space identifier (low 4 bits of the color model word).
    pub color_space: u32,
    /// Payload kind.
    pub layout: LayoutType,
    /// Rendition name.
    pub name: String,
    /// Length of the TLV block.
    pub tlv_length: u32,
    /// Length of the payload following the TLV block.
    pub payload_length: u32,
}

const FLAG_OPAQUE: u32 = 1 << 3;
const FLAG_COMPLETE_TEXTURE_EXTRUSION: u32 = 1 << 12;

impl CsiHeader {
    pub(crate) fn parse(record: &[u8]) -> CarResult<Self> {
        let mut r = ByteReader::new(record, "rendition header");
        let tag = r.u32_le()?;
        if tag != CSI_TAG {
            return Err(CarError::invalid_format(format!(
                "rendition header tag {tag:#010x} is not CTSI"
            )));
        }
        let version = r.u32_le()?;
        let flags = r.u32_le()?;
        let width = r.u32_le()?;
        let height = r.u32_le()?;
        let scale_factor = r.u32_le()?;
        let pixel_format = PixelFormat::new(r.u32_le()?);
        let color_space = r.u32_le()? & 0xf;
        let _mod_time = r.u32_le()?;
        let layout = LayoutType::new(r.u16_le()?);
        let _zero = r.u16_le()?;
        let name = r.fixed_str(128)?;
        let tlv_length = r.u32_le()?;
        let _unknown = r.u32_le()?;
        let _zero = r.u32_le()?;
        let payload_length = r.u32_le()?;
        debug_assert_eq!(r.position(), CSI_HEADER_LEN);
        Ok(Self {
            version,
            flags,
            width,
            height,
            scale_factor,
            pixel_format,
            color_space,
            layout,
            name,
            tlv_length,
            payload_length,
        })
    }

    /// Scale as a float (`2.0` for `@2x`); a zero field reads as `1.0`.
    pub fn scale(&self) -> f64 {
        if self.scale_factor == 0 {
            1.0
        } else {
            f64::from(self.scale_factor) / 100.0
        }
    }

    /// Rendition is flagged as having no transparent pixels.
    pub fn is_opaque(&self) -> bool {
        self.flags & FLAG_OPAQUE != 0
    }

    /// Packed atlas was built with complete texture extrusion.
    pub fn complete_texture_extrusion(&self) -> bool {
        self.flags & FLAG_COMPLETE_TEXTURE_EXTRUSION != 0
    }
}

/// Edge insets and content size from the metrics TLV.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    /// Top-left inset `(width, height)`.
    pub top_left: (u32, u32),
    /// Bottom-right inset `(width, height)`.
    pub bottom_right: (u32, u32),
    /// Uncropped image size.
    pub image_size: (u32, u32),
}

impl Metrics {
    /// Transparent border was cropped away at compile time.
    pub fn is_alpha_cropped(&self) -> bool {
        self.top_left != (0, 0) || self.bottom_right != (0, 0)
    }
}

/// Optional properties carried in the TLV block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CsiProperties {
    /// Slicing metrics.
    pub metrics: Option<Metrics>,
    /// Uniform type identifier of a data payload.
    pub uti: Option<String>,
    /// EXIF orientation (1 when absent).
    pub exif_orientation: u32,
    /// Asset pack identifier of an external link.
    pub external_tags: Option<String>,
    /// Slice rectangle `(x, y, width, height)` inside a packed atlas.
    pub frame: Option<(i32, i32, u32, u32)>,
    /// Physical size of a recognition image in meters.
    pub physical_size: Option<(f64, f64)>,
}

const TLV_METRICS: u32 = 1003;
const TLV_UTI: u32 = 1005;
const TLV_EXIF_ORIENTATION: u32 = 1006;
const TLV_EXTERNAL_TAGS: u32 = 1008;
const TLV_FRAME: u32 = 1009;
const TLV_PHYSICAL_SIZE: u32 = 1010;

impl CsiProperties {
    fn parse(block: &[u8]) -> CarResult<Self> {
        let mut props = Self {
            exif_orientation: 1,
            ..Self::default()
        };
        let mut r = ByteReader::new(block, "rendition properties");
        while r.remaining() >= 8 {
            let kind = r.u32_le()?;
            let len = r.u32_le()? as usize;
            let mut v = ByteReader::new(r.take(len)?, "rendition property");
            match kind {
                TLV_METRICS => {
                    let _count = v.u32_le()?;
                    props.metrics = Some(Metrics {
                        top_left: (v.u32_le()?, v.u32_le()?),
                        bottom_right: (v.u32_le()?, v.u32_le()?),
                        image_size: (v.u32_le()?, v.u32_le()?),
                    });
                }
                TLV_UTI => {
                    let n = v.u32_le()? as usize;
                    let _reserved = v.u32_le()?;
                    props.uti = Some(v.fixed_str(n)?);
                }
                TLV_EXIF_ORIENTATION => props.exif_orientation = v.u32_le()?,
                TLV_EXTERNAL_TAGS => props.external_tags = Some(c_string(v.rest())),
                TLV_FRAME => {
                    props.frame = Some((v.i32_le()?, v.i32_le()?, v.u32_le()?, v.u32_le()?));
                }
                TLV_PHYSICAL_SIZE => props.physical_size = Some((v.f64_le()?, v.f64_le()?)),
                _ => {}
            }
        }
        Ok(props)
    }
}

/// Parsed rendition record borrowing its payload from the container.
#[derive(Clone, Debug)]
pub(crate) struct CsiRecord<'a> {
    pub(crate) header: CsiHeader,
    pub(crate) properties: CsiProperties,
    pub(crate) payload: &'a [u8],
}

impl<'a> CsiRecord<'a> {
    pub(crate) fn parse(record: &'a [u8]) -> CarResult<Self> {
        let header = CsiHeader::parse(record)?;
        let mut r = ByteReader::new(record, "rendition record");
        r.skip(CSI_HEADER_LEN)?;
        let properties = CsiProperties::parse(r.take(header.tlv_length as usize)?)?;
        let payload_len = header.payload_length as usize;
        if payload_len > r.remaining() {
            return Err(CarError::invalid_format(format!(
                "rendition {:?} declares {payload_len} payload bytes, {} present",
                header.name,
                r.remaining()
            )));
        }
        let payload = r.take(payload_len)?;
        Ok(Self {
            header,
            properties,
            payload,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rendition/csi.rs"]
mod tests;
