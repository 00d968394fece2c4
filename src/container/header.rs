use crate::foundation::bytes::{ByteReader, fourcc};
use crate::foundation::error::{CarError, CarResult};
use crate::key::attributes::RenditionAttribute;

const CAR_HEADER_TAG: u32 = fourcc(b"CTAR");
const KEY_FORMAT_TAG: u32 = fourcc(b"kfmt");

/// Catalog-wide header stored under the `CARHEADER` variable.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CarHeader {
    /// CoreUI build that compiled the catalog.
    pub coreui_version: u32,
    /// Storage format version.
    pub storage_version: u32,
    /// Compile timestamp (seconds since the Unix epoch).
    pub storage_timestamp: u32,
    /// Rendition count recorded by the compiler.
    pub rendition_count: u32,
    /// Program/version banner of the compiler.
    pub main_version_string: String,
    /// Tool version string.
    pub version_string: String,
    /// Catalog UUID.
    pub uuid: [u8; 16],
    /// Checksum of the associated resource.
    pub associated_checksum: u32,
    /// Schema version.
    pub schema_version: u32,
    /// Default color space identifier.
    pub color_space_id: u32,
    /// Key semantics revision.
    pub key_semantics: u32,
}

impl CarHeader {
    pub(crate) fn parse(block: &[u8]) -> CarResult<Self> {
        let mut r = ByteReader::new(block, "car header");
        let tag = r.u32_le()?;
        if tag != CAR_HEADER_TAG {
            return Err(CarError::invalid_format(format!(
                "car header tag {tag:#010x} is not CTAR"
            )));
        }
        Ok(Self {
            coreui_version: r.u32_le()?,
            storage_version: r.u32_le()?,
            storage_timestamp: r.u32_le()?,
            rendition_count: r.u32_le()?,
            main_version_string: r.fixed_str(128)?,
            version_string: r.fixed_str(256)?,
            uuid: r
                .take(16)?
                .try_into()
                .map_err(|_| CarError::invalid_format("car header uuid"))?,
            associated_checksum: r.u32_le()?,
            schema_version: r.u32_le()?,
            color_space_id: r.u32_le()?,
            key_semantics: r.u32_le()?,
        })
    }

    /// UUID formatted as `8-4-4-4-12` hex.
    pub fn uuid_string(&self) -> String {
        let hex: String = self.uuid.iter().map(|b| format!("{b:02X}")).collect();
        format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }
}

/// Order of attribute tokens in every rendition key (`KEYFORMAT` variable).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyFormat {
    /// Attributes in token order.
    pub attributes: Vec<RenditionAttribute>,
}

impl KeyFormat {
    pub(crate) fn parse(block: &[u8]) -> CarResult<Self> {
        let mut r = ByteReader::new(block, "key format");
        let tag = r.u32_le()?;
        if tag != KEY_FORMAT_TAG {
            return Err(CarError::invalid_format(format!(
                "key format tag {tag:#010x} is not kfmt"
            )));
        }
        let _version = r.u32_le()?;
        let count = r.u32_le()? as usize;
        if count > r.remaining() / 4 {
            return Err(CarError::invalid_format(format!(
                "key format declares {count} tokens past its end"
            )));
        }
        let mut attributes = Vec::with_capacity(count);
        for _ in 0..count {
            let raw = r.u32_le()?;
            let raw = u16::try_from(raw).map_err(|_| {
                CarError::invalid_format(format!("key format token {raw} out of range"))
            })?;
            attributes.push(RenditionAttribute::new(raw));
        }
        Ok(Self { attributes })
    }

    /// Pair raw key tokens with their attributes.
    ///
    /// Keys shorter than the format are zero-extended; extra trailing tokens are ignored.
    pub(crate) fn decode_tokens(&self, key: &[u8]) -> CarResult<Vec<(RenditionAttribute, u16)>> {
        if key.len() % 2 != 0 {
            return Err(CarError::invalid_format(format!(
                "rendition key of {} bytes is not a token array",
                key.len()
            )));
        }
        let mut r = ByteReader::new(key, "rendition key");
        let mut out = Vec::with_capacity(self.attributes.len());
        for attr in &self.attributes {
            let value = if r.remaining() >= 2 { r.u16_le()? } else { 0 };
            out.push((*attr, value));
        }
        Ok(out)
    }

    /// Inverse of [`KeyFormat::decode_tokens`].
    pub(crate) fn encode_tokens(&self, attrs: &[(RenditionAttribute, u16)]) -> Vec<u16> {
        self.attributes
            .iter()
            .map(|attr| {
                attrs
                    .iter()
                    .find(|(a, _)| a == attr)
                    .map(|(_, v)| *v)
                    .unwrap_or(0)
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/container/header.rs"]
mod tests;
