//! Pixel work outside decoding: layer compositing, vector rasterization and previews.

/// Premultiplied blending and layer flattening.
pub mod composite;
/// Bounded previews.
pub mod preview;
/// On-demand vector rasterization.
pub mod vector;
