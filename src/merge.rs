use crate::catalog::{Catalog, LevelCatalog, LevelCode, PartialCatalog, PartialLevel};

/// Combines a fully populated base catalog with a region override fragment.
///
/// The result is built fresh; neither input is mutated, so the embedded
/// default catalog can serve as a frozen baseline across region switches.
/// Override labels apply only when non-empty, and an override subject
/// replaces that subject's link list wholesale. Levels and subjects the
/// override does not mention are carried over from the base unchanged.
pub fn merge(base: &Catalog, overlay: &PartialCatalog) -> Catalog {
    Catalog {
        k: merge_level(&base.k, overlay.level(LevelCode::K)),
        p: merge_level(&base.p, overlay.level(LevelCode::P)),
        h: merge_level(&base.h, overlay.level(LevelCode::H)),
    }
}

fn merge_level(base: &LevelCatalog, fragment: Option<&PartialLevel>) -> LevelCatalog {
    let mut out = base.clone();
    let Some(fragment) = fragment else {
        return out;
    };
    if let Some(label) = fragment.label.as_deref() {
        if !label.is_empty() {
            out.label = label.to_string();
        }
    }
    for (subject, links) in &fragment.subjects {
        out.subjects.insert(subject.clone(), links.clone());
    }
    out
}
