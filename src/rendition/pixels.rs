//! Pixel payload decoding: `CELM` raw/zip/lzfse bitmaps and `RAWD` encoded images.

use std::io::{Cursor, Read};

use crate::foundation::bytes::{ByteReader, fourcc};
use crate::foundation::core::{Bitmap, alloc_bytes, rgba_len};
use crate::foundation::error::{CarError, CarResult};
use crate::rendition::csi::PixelFormat;

const CELM_TAG: u32 = fourcc(b"CELM");
pub(crate) const RAWD_TAG: u32 = fourcc(b"RAWD");
const ROW_ALIGN: usize = 16;

/// `CELM` compression tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Compression {
    None,
    Zip,
    Lzfse,
    Other(u32),
}

impl Compression {
    fn new(raw: u32) -> Self {
        match raw {
            0 => Self::None,
            2 => Self::Zip,
            4 => Self::Lzfse,
            x => Self::Other(x),
        }
    }
}

fn compression_name(raw: u32) -> &'static str {
    match raw {
        1 => "rle",
        3 => "lzvn",
        4 => "lzfse",
        5 => "jpeg-lzfse",
        6 => "blurred",
        7 => "astc",
        8 => "palette-img",
        9 => "hevc",
        10 => "deepmap-lzfse",
        11 => "deepmap2",
        _ => "unknown",
    }
}

/// Split a `RAWD` chunk into `(version, data)`.
pub(crate) fn read_rawd(payload: &[u8]) -> CarResult<(u32, &[u8])> {
    let mut r = ByteReader::new(payload, "raw data chunk");
    let tag = r.u32_le()?;
    if tag != RAWD_TAG {
        return Err(CarError::invalid_format(format!(
            "raw data tag {tag:#010x} is not RAWD"
        )));
    }
    let version = r.u32_le()?;
    let len = r.u32_le()? as usize;
    Ok((version, r.take(len)?))
}

/// Decode an image-bearing payload by pixel format.
pub(crate) fn decode_bitmap(
    payload: &[u8],
    format: PixelFormat,
    width: u32,
    height: u32,
    max_bytes: usize,
) -> CarResult<Bitmap> {
    match format {
        PixelFormat::Argb | PixelFormat::Ga8 | PixelFormat::Ga16 => {
            decode_celm(payload, format, width, height, max_bytes)
        }
        PixelFormat::Jpeg | PixelFormat::Png | PixelFormat::Data => {
            let (_, data) = read_rawd(payload)?;
            decode_encoded_image(data, max_bytes)
        }
        other => Err(CarError::unsupported(format!(
            "pixel format {}",
            other.code()
        ))),
    }
}

fn bytes_per_pixel(format: PixelFormat) -> usize {
    match format {
        PixelFormat::Ga8 => 2,
        _ => 4,
    }
}

fn decode_celm(
    payload: &[u8],
    format: PixelFormat,
    width: u32,
    height: u32,
    max_bytes: usize,
) -> CarResult<Bitmap> {
    let mut r = ByteReader::new(payload, "pixel chunk");
    let tag = r.u32_le()?;
    if tag != CELM_TAG {
        return Err(CarError::unsupported(format!(
            "pixel chunk {tag:#010x} for format {}",
            format.code()
        )));
    }
    let _version = r.u32_le()?;
    let compression = r.u32_le()?;
    let len = r.u32_le()? as usize;
    let data = r.take(len)?;

    let out_len = rgba_len(width, height)?;
    if out_len > max_bytes {
        return Err(CarError::out_of_memory(format!(
            "{width}x{height} bitmap needs {out_len} bytes, limit is {max_bytes}"
        )));
    }
    let row_len = (width as usize) * bytes_per_pixel(format);
    let packed_len = row_len * height as usize;

    let raw = match Compression::new(compression) {
        Compression::None => data.to_vec(),
        Compression::Zip => inflate(data, max_bytes)?,
        Compression::Lzfse => unlzfse(data, max_bytes)?,
        Compression::Other(x) => {
            return Err(CarError::unsupported(format!(
                "pixel compression {x} ({})",
                compression_name(x)
            )));
        }
    };

    if raw.len() < packed_len {
        return Err(CarError::invalid_format(format!(
            "{width}x{height} {} bitmap needs {packed_len} bytes, {} present",
            format.code(),
            raw.len()
        )));
    }
    // Rows are packed unless the buffer holds exactly `height` 16-byte aligned rows.
    let aligned = row_len.next_multiple_of(ROW_ALIGN);
    let stride = if aligned != row_len && Some(raw.len()) == aligned.checked_mul(height as usize)
    {
        aligned
    } else {
        row_len
    };

    let mut out = alloc_bytes(out_len)?;
    for y in 0..height as usize {
        let src = &raw[y * stride..y * stride + row_len];
        let dst = &mut out[y * width as usize * 4..(y + 1) * width as usize * 4];
        match format {
            PixelFormat::Ga8 => {
                for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(2)) {
                    d.copy_from_slice(&[s[0], s[0], s[0], s[1]]);
                }
            }
            PixelFormat::Ga16 => {
                for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                    let g = (u16::from_le_bytes([s[0], s[1]]) >> 8) as u8;
                    let a = (u16::from_le_bytes([s[2], s[3]]) >> 8) as u8;
                    d.copy_from_slice(&[g, g, g, a]);
                }
            }
            _ => {
                for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                    d.copy_from_slice(&[s[2], s[1], s[0], s[3]]);
                }
            }
        }
    }
    Bitmap::new(width, height, out)
}

/// Inflate zlib- or raw-deflate data, refusing to grow past `limit` bytes.
fn inflate(data: &[u8], limit: usize) -> CarResult<Vec<u8>> {
    let cap = (limit as u64).saturating_add(1);
    let mut out = Vec::new();
    let read = if data.first() == Some(&0x78) {
        flate2::read::ZlibDecoder::new(data)
            .take(cap)
            .read_to_end(&mut out)
    } else {
        flate2::read::DeflateDecoder::new(data)
            .take(cap)
            .read_to_end(&mut out)
    };
    read.map_err(|e| CarError::invalid_format(format!("inflate pixel data: {e}")))?;
    if out.len() > limit {
        return Err(CarError::out_of_memory(format!(
            "inflated pixel data exceeds {limit} bytes"
        )));
    }
    Ok(out)
}

/// Expand an LZFSE stream (`bvx2`/`bvxn`/`bvx-` blocks up to `bvx$`).
fn unlzfse(data: &[u8], limit: usize) -> CarResult<Vec<u8>> {
    let mut out = Vec::new();
    lzfse_rust::decode_bytes(data, &mut out)
        .map_err(|e| CarError::invalid_format(format!("lzfse pixel data: {e}")))?;
    if out.len() > limit {
        return Err(CarError::out_of_memory(format!(
            "lzfse pixel data exceeds {limit} bytes"
        )));
    }
    Ok(out)
}

/// Decode an embedded JPEG/PNG (or other `image`-supported) file into premultiplied RGBA8.
pub(crate) fn decode_encoded_image(bytes: &[u8], max_bytes: usize) -> CarResult<Bitmap> {
    let mut limits = image::Limits::default();
    limits.max_alloc = Some(max_bytes as u64);

    let mut reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(CarError::Io)?;
    if reader.format().is_none() {
        return Err(CarError::unsupported("embedded image format not recognized"));
    }
    reader.limits(limits);
    let dyn_img = reader.decode().map_err(|e| match e {
        image::ImageError::Unsupported(e) => CarError::unsupported(e.to_string()),
        image::ImageError::Limits(e) => CarError::out_of_memory(e.to_string()),
        other => CarError::invalid_format(format!("decode embedded image: {other}")),
    })?;
    let rgba = dyn_img.to_rgba8();
    if rgba.as_raw().len() > max_bytes {
        return Err(CarError::out_of_memory(format!(
            "{}x{} image exceeds {max_bytes} bytes",
            rgba.width(),
            rgba.height()
        )));
    }
    Ok(Bitmap::from_rgba_image(rgba))
}

#[cfg(test)]
#[path = "../../tests/unit/rendition/pixels.rs"]
mod tests;
