//! Shared building blocks: errors, bitmaps, byte cursors and pixel math.

pub(crate) mod bytes;
/// Bitmap and color primitives.
pub mod core;
/// Error taxonomy.
pub mod error;
pub(crate) mod math;
