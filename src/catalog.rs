use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Audience tier. All three tiers exist in every resolved [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelCode {
    K,
    P,
    H,
}

impl LevelCode {
    pub const ALL: [LevelCode; 3] = [LevelCode::K, LevelCode::P, LevelCode::H];

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelCode::K => "k",
            LevelCode::P => "p",
            LevelCode::H => "h",
        }
    }
}

impl fmt::Display for LevelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelCode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "k" | "kindergarten" => Ok(LevelCode::K),
            "p" | "primary" => Ok(LevelCode::P),
            "h" | "high" => Ok(LevelCode::H),
            other => Err(format!("unknown level code {other:?} (expected k, p, or h)")),
        }
    }
}

/// A single curated link. Wire form uses the compact field names
/// `t`/`u`/`d`/`img` shared with the content documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    #[serde(rename = "t")]
    pub title: String,
    #[serde(rename = "u")]
    pub url: String,
    #[serde(rename = "d", default)]
    pub description: String,
    #[serde(rename = "img", default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LinkItem {
    /// Stable render key: the URL lowercased with non-alphanumeric runs
    /// collapsed to single hyphens. Unique within one subject's list.
    pub fn key(&self) -> String {
        slug(&self.url)
    }
}

/// Ordered subject-name → link-list mapping. Insertion order is the authored
/// curation order and is significant for display.
pub type SubjectCatalog = IndexMap<String, Vec<LinkItem>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelCatalog {
    pub label: String,
    pub subjects: SubjectCatalog,
}

/// Fully resolved content catalog. The three tiers are struct fields rather
/// than map entries so "all levels present" holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub k: LevelCatalog,
    pub p: LevelCatalog,
    pub h: LevelCatalog,
}

impl Catalog {
    pub fn level(&self, code: LevelCode) -> &LevelCatalog {
        match code {
            LevelCode::K => &self.k,
            LevelCode::P => &self.p,
            LevelCode::H => &self.h,
        }
    }

    pub fn levels(&self) -> [(LevelCode, &LevelCatalog); 3] {
        [
            (LevelCode::K, &self.k),
            (LevelCode::P, &self.p),
            (LevelCode::H, &self.h),
        ]
    }
}

/// Region override fragment: any subset of levels, each with an optional
/// label and a partial subject map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialCatalog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<PartialLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<PartialLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<PartialLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialLevel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub subjects: SubjectCatalog,
}

impl PartialCatalog {
    pub fn level(&self, code: LevelCode) -> Option<&PartialLevel> {
        match code {
            LevelCode::K => self.k.as_ref(),
            LevelCode::P => self.p.as_ref(),
            LevelCode::H => self.h.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_none() && self.p.is_none() && self.h.is_none()
    }

    /// Decodes an externally authored override document, dropping malformed
    /// fragments instead of rejecting the whole document. A level that is not
    /// an object, or a subject whose list fails to decode, is skipped with a
    /// warning; everything well-formed around it survives.
    pub fn from_value(doc: &Value) -> Self {
        let mut out = PartialCatalog::default();
        let Some(map) = doc.as_object() else {
            warn!("override document is not a JSON object; ignoring");
            return out;
        };
        for code in LevelCode::ALL {
            let Some(fragment) = map.get(code.as_str()) else {
                continue;
            };
            match PartialLevel::from_value(fragment) {
                Some(level) => match code {
                    LevelCode::K => out.k = Some(level),
                    LevelCode::P => out.p = Some(level),
                    LevelCode::H => out.h = Some(level),
                },
                None => warn!(level = code.as_str(), "skipping malformed override level"),
            }
        }
        out
    }
}

impl PartialLevel {
    fn from_value(fragment: &Value) -> Option<Self> {
        let map = fragment.as_object()?;
        let label = map
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_string);
        let mut subjects = SubjectCatalog::new();
        if let Some(raw) = map.get("subjects") {
            let entries = raw.as_object()?;
            for (subject, links) in entries {
                match serde_json::from_value::<Vec<LinkItem>>(links.clone()) {
                    Ok(links) => {
                        subjects.insert(subject.clone(), links);
                    }
                    Err(err) => {
                        warn!(subject, error = %err, "skipping malformed override subject");
                    }
                }
            }
        }
        Some(PartialLevel { label, subjects })
    }
}

/// Lowercases the input and collapses non-alphanumeric runs to hyphens.
pub fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_item_wire_format() {
        let item: LinkItem = serde_json::from_value(json!({
            "t": "PhET Simulations",
            "u": "https://phet.colorado.edu/",
            "d": "Interactive science sims."
        }))
        .unwrap();
        assert_eq!(item.title, "PhET Simulations");
        assert_eq!(item.url, "https://phet.colorado.edu/");
        assert_eq!(item.image, None);

        let encoded = serde_json::to_value(&item).unwrap();
        assert_eq!(encoded["t"], "PhET Simulations");
        assert!(encoded.get("img").is_none());
    }

    #[test]
    fn link_item_tolerates_missing_description() {
        let item: LinkItem =
            serde_json::from_value(json!({ "t": "Desmos", "u": "https://www.desmos.com/" }))
                .unwrap();
        assert_eq!(item.description, "");
    }

    #[test]
    fn subject_order_is_preserved() {
        let level: LevelCatalog = serde_json::from_value(json!({
            "label": "Primary",
            "subjects": {
                "Maths": [],
                "Science": [],
                "Geography": [],
                "History": []
            }
        }))
        .unwrap();
        let order: Vec<_> = level.subjects.keys().cloned().collect();
        assert_eq!(order, ["Maths", "Science", "Geography", "History"]);
    }

    #[test]
    fn partial_catalog_skips_malformed_level() {
        let doc = json!({
            "h": { "label": "Secondary", "subjects": {} },
            "p": "not an object"
        });
        let partial = PartialCatalog::from_value(&doc);
        assert!(partial.p.is_none());
        assert_eq!(partial.h.as_ref().unwrap().label.as_deref(), Some("Secondary"));
    }

    #[test]
    fn partial_catalog_skips_malformed_subject() {
        let doc = json!({
            "h": {
                "subjects": {
                    "History": [{ "t": "Facing History", "u": "https://www.facinghistory.org/", "d": "" }],
                    "Maths": [{ "bogus": true }]
                }
            }
        });
        let partial = PartialCatalog::from_value(&doc);
        let level = partial.h.as_ref().unwrap();
        assert!(level.subjects.contains_key("History"));
        assert!(!level.subjects.contains_key("Maths"));
    }

    #[test]
    fn level_code_round_trip() {
        for code in LevelCode::ALL {
            assert_eq!(code.as_str().parse::<LevelCode>().unwrap(), code);
        }
        assert_eq!("kindergarten".parse::<LevelCode>().unwrap(), LevelCode::K);
        assert!("x".parse::<LevelCode>().is_err());
    }

    #[test]
    fn slug_collapses_runs() {
        assert_eq!(
            slug("https://phet.colorado.edu/"),
            "https-phet-colorado-edu"
        );
        assert_eq!(slug("A  B!!c"), "a-b-c");
        assert_eq!(slug(""), "");
    }
}
