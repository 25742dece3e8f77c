use crate::catalog::{Catalog, LevelCode, LinkItem};

/// Produces the ordered list of links to render for one selection.
///
/// A subject missing from the level yields an empty list, never an error.
/// An empty query returns the authored list untouched; otherwise items match
/// when the query appears case-insensitively in the title, description, or
/// URL, and relative order is preserved.
pub fn visible_items<'a>(
    catalog: &'a Catalog,
    level: LevelCode,
    subject: &str,
    query: &str,
) -> Vec<&'a LinkItem> {
    let Some(links) = catalog.level(level).subjects.get(subject) else {
        return Vec::new();
    };
    if query.is_empty() {
        return links.iter().collect();
    }
    let needle = query.to_lowercase();
    links.iter().filter(|item| matches(item, &needle)).collect()
}

fn matches(item: &LinkItem, needle: &str) -> bool {
    item.title.to_lowercase().contains(needle)
        || item.description.to_lowercase().contains(needle)
        || item.url.to_lowercase().contains(needle)
}
