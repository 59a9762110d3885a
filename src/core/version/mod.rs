pub mod catalog;
pub mod manifest;

pub use catalog::{CatalogSnapshot, VersionCatalog, VersionDescriptor};
pub use manifest::{VersionEntry, VersionManifest};
