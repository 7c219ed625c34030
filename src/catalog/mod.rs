//! CSV-backed movie catalog: file access, the enrichment index, the
//! derived-catalog synchronizer, and genre normalization.

pub mod file;
pub mod genres;
pub mod index;
pub mod sync;

pub use file::CatalogFile;
pub use index::CatalogIndex;
pub use sync::{sync_catalog, SyncReport};
