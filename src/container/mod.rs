/// Block-addressed BOM store and its B-tree walk.
pub(crate) mod bom;
/// Container handle, index entries and side tables.
pub mod catalog;
/// `CARHEADER` and `KEYFORMAT` records.
pub mod header;
