//! Rendition walk: visits every index entry once, decodes it, and builds the consumer lookup.

/// Consumer view of one rendition.
pub mod lookup;
/// Sequential and chunked-parallel walks.
pub mod walk;
