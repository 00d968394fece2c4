//! carscope reads compiled asset catalogs (`.car` files) without the platform runtime.
//!
//! A catalog is a BOM store holding a B-tree of renditions keyed by classification attributes.
//! The crate is layered the same way data flows through it:
//!
//! - Open a [`Container`] (validates the store, header and key format)
//! - Walk it with [`enumerate`], which decodes each entry into a [`Rendition`]
//! - Hand the resulting [`NamedLookup`]s to a [`LookupSink`], optionally bounded by
//!   [`PreviewOpts`]
#![forbid(unsafe_code)]

/// BOM store, catalog header and the container handle.
pub mod container;
/// Rendition walk and consumer lookups.
pub mod enumerate;
/// Sinks and output naming.
pub mod export;
/// Errors, bitmaps and shared primitives.
pub mod foundation;
/// Rendition keys and classification attributes.
pub mod key;
/// Compositing, vector rasterization and previews.
pub mod render;
/// Rendition records and decoded payload types.
pub mod rendition;

pub use crate::container::catalog::{Container, Entries, IndexEntry, OpenOpts};
pub use crate::container::header::{CarHeader, KeyFormat};
pub use crate::enumerate::lookup::NamedLookup;
pub use crate::enumerate::walk::{
    EnumerateOpts, EnumerationSummary, Visit, enumerate, enumerate_to_sink,
};
pub use crate::export::sink::{DirectorySink, InMemorySink, LookupSink};
pub use crate::foundation::core::{Bitmap, Rect, Rgba8Premul, Size};
pub use crate::foundation::error::{CarError, CarResult};
pub use crate::key::attributes::{
    DisplayGamut, GraphicsClass, Idiom, MemoryClass, RenditionAttribute, SizeClass,
};
pub use crate::key::rendition_key::RenditionKey;
pub use crate::render::preview::{PreviewOpts, needs_background, render_preview};
pub use crate::render::vector::rasterize_vector;
pub use crate::rendition::model::{NamedImage, Rendition, RenditionKind};

#[cfg(test)]
#[path = "../tests/support/mod.rs"]
pub(crate) mod support;
