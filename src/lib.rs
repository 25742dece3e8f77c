pub mod catalog;
pub mod filter;
pub mod level;
pub mod loader;
pub mod merge;
pub mod state;
pub mod strings;
#[cfg(feature = "web")]
pub mod web;

use once_cell::sync::Lazy;

pub use catalog::{Catalog, LevelCatalog, LevelCode, LinkItem, PartialCatalog, SubjectCatalog};
pub use filter::visible_items;
pub use loader::{CatalogStore, ContentLoader, ContentSource, GLOBAL_REGION};
pub use state::{Bootstrap, SelectionEvent, SelectionState};

static DEFAULT_CONTENT_JSON: &str = include_str!("../assets/content.global.json");

static DEFAULT_CATALOG: Lazy<Catalog> =
    Lazy::new(|| serde_json::from_str(DEFAULT_CONTENT_JSON).expect("embedded default catalog"));

/// The built-in catalog shipped inside the binary. Used whenever no global
/// content document can be fetched, and as the frozen merge baseline.
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}
