use crate::catalog::{Catalog, LevelCode};
use crate::level;

/// Subject preselected at startup when the detected level offers it.
pub const DEFAULT_SUBJECT: &str = "Science";
/// Region that carries no override document.
pub const DEFAULT_REGION: &str = "global";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Everything the user has currently selected. Derived once at startup from
/// [`Bootstrap`] inputs and advanced only through [`SelectionState::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub level: LevelCode,
    pub subject: String,
    pub query: String,
    pub region: String,
    pub language: String,
    pub ad_free: bool,
}

/// Raw startup inputs: the serving hostname, optional URL parameters, and
/// the persisted ad-free preference.
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    pub hostname: String,
    pub region: Option<String>,
    pub language: Option<String>,
    pub ad_free: bool,
}

/// One discrete user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    SelectLevel(LevelCode),
    SelectSubject(String),
    SetQuery(String),
    SelectRegion(String),
    SelectLanguage(String),
    ToggleAdFree,
}

impl SelectionState {
    pub fn initial(catalog: &Catalog, boot: &Bootstrap) -> Self {
        let level = level::detect(&boot.hostname);
        SelectionState {
            level,
            subject: default_subject(catalog, level).to_string(),
            query: String::new(),
            region: normalized(boot.region.as_deref(), DEFAULT_REGION),
            language: normalized(boot.language.as_deref(), DEFAULT_LANGUAGE),
            ad_free: boot.ad_free,
        }
    }

    /// Pure transition function: returns the state after one event, leaving
    /// `self` untouched. The subject invariant (always a key of the current
    /// level's subject map) is maintained here: a level switch that orphans
    /// the selected subject falls back to the new level's first declared
    /// subject, and selecting a subject the level does not define is ignored.
    pub fn apply(&self, event: &SelectionEvent, catalog: &Catalog) -> Self {
        let mut next = self.clone();
        match event {
            SelectionEvent::SelectLevel(code) => {
                next.level = *code;
                if !catalog.level(*code).subjects.contains_key(&next.subject) {
                    next.subject = first_subject(catalog, *code).to_string();
                }
            }
            SelectionEvent::SelectSubject(subject) => {
                if catalog.level(next.level).subjects.contains_key(subject) {
                    next.subject = subject.clone();
                }
            }
            SelectionEvent::SetQuery(query) => next.query = query.clone(),
            SelectionEvent::SelectRegion(region) => {
                next.region = region.trim().to_ascii_lowercase();
            }
            SelectionEvent::SelectLanguage(language) => {
                next.language = language.trim().to_ascii_lowercase();
            }
            SelectionEvent::ToggleAdFree => next.ad_free = !next.ad_free,
        }
        next
    }

    /// Clamps the subject after the catalog itself was replaced (a region
    /// switch may drop the selected subject from the current level).
    pub fn reconcile(&self, catalog: &Catalog) -> Self {
        if catalog
            .level(self.level)
            .subjects
            .contains_key(&self.subject)
        {
            return self.clone();
        }
        let mut next = self.clone();
        next.subject = first_subject(catalog, self.level).to_string();
        next
    }
}

/// True when an `adfree` URL parameter requests the ad-free rendition.
pub fn ad_free_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

fn default_subject(catalog: &Catalog, level: LevelCode) -> &str {
    let subjects = &catalog.level(level).subjects;
    if subjects.contains_key(DEFAULT_SUBJECT) {
        DEFAULT_SUBJECT
    } else {
        first_subject(catalog, level)
    }
}

fn first_subject(catalog: &Catalog, level: LevelCode) -> &str {
    catalog
        .level(level)
        .subjects
        .keys()
        .next()
        .map(String::as_str)
        .unwrap_or(DEFAULT_SUBJECT)
}

fn normalized(raw: Option<&str>, fallback: &str) -> String {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.to_ascii_lowercase(),
        None => fallback.to_string(),
    }
}
