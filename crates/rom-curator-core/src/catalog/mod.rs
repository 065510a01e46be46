mod entry;
mod index;
mod source;

pub use entry::CatalogEntry;
pub use index::CatalogIndex;
pub use source::{load_catalog, CatalogSource, JsonCatalogSource, SourceRegistry};
