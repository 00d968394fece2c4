/// Attribute identifiers and classification enums.
pub mod attributes;
/// Rendition classification key.
pub mod rendition_key;
