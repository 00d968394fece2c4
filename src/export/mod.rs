//! Host-side consumers of a walk.

/// Output filenames.
pub mod naming;
/// Lookup sinks.
pub mod sink;
