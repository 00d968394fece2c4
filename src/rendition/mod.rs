//! Rendition records and their decoded payloads.

/// Named color payloads.
pub mod color;
/// Fixed rendition header and TLV properties.
pub mod csi;
/// Layout dispatch from raw records to [`model::Rendition`].
pub mod decode;
pub(crate) mod layers;
/// Decoded rendition types.
pub mod model;
pub(crate) mod pixels;
