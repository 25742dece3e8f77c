use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, PartialCatalog};
use crate::{default_catalog, merge};

pub const GLOBAL_REGION: &str = "global";
const GLOBAL_DOCUMENT: &str = "content.global.json";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where content documents come from.
#[derive(Debug, Clone)]
pub enum ContentSource {
    /// Embedded default catalog only; no override documents exist.
    BuiltIn,
    /// Documents read from a directory on disk.
    Dir(PathBuf),
    /// Documents fetched from an HTTP base URL.
    Http { base_url: String },
}

/// Resolves a region to a complete catalog. Every failure mode degrades to
/// something renderable: a broken global document falls back to the embedded
/// default, a broken override is simply not applied.
pub struct ContentLoader {
    source: ContentSource,
    client: reqwest::Client,
}

impl ContentLoader {
    pub fn new(source: ContentSource) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dtg-directory/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("construct http client");
        Self { source, client }
    }

    pub fn source(&self) -> &ContentSource {
        &self.source
    }

    /// Loads and merges the catalog for `region`. Never fails; see the
    /// type-level docs for the degradation rules.
    pub async fn load(&self, region: &str) -> Catalog {
        let region = region.trim().to_ascii_lowercase();
        let base = self.load_base().await;
        let overlay = if region == GLOBAL_REGION {
            PartialCatalog::default()
        } else {
            self.load_overlay(&region).await
        };
        merge::merge(&base, &overlay)
    }

    /// Loads `region` and installs the result into `store`, unless a newer
    /// refresh began while this one was in flight. Returns whether the
    /// result was installed.
    pub async fn refresh(&self, store: &CatalogStore, region: &str) -> bool {
        let token = store.begin_refresh();
        let catalog = self.load(region).await;
        let installed = store.install(token, region, catalog);
        if installed {
            info!(region, "catalog refreshed");
        } else {
            debug!(region, "discarding superseded catalog load");
        }
        installed
    }

    async fn load_base(&self) -> Catalog {
        let Some(doc) = self.fetch_document(GLOBAL_DOCUMENT).await else {
            return default_catalog().clone();
        };
        match serde_json::from_value::<Catalog>(doc) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(error = %err, "global content document malformed; using built-in catalog");
                default_catalog().clone()
            }
        }
    }

    async fn load_overlay(&self, region: &str) -> PartialCatalog {
        if !valid_region(region) {
            warn!(region, "invalid region identifier; skipping override");
            return PartialCatalog::default();
        }
        let name = format!("content.{region}.json");
        match self.fetch_document(&name).await {
            Some(doc) => PartialCatalog::from_value(&doc),
            None => PartialCatalog::default(),
        }
    }

    async fn fetch_document(&self, name: &str) -> Option<Value> {
        match &self.source {
            ContentSource::BuiltIn => None,
            ContentSource::Dir(dir) => {
                let path = dir.join(name);
                let raw = match std::fs::read_to_string(&path) {
                    Ok(raw) => raw,
                    Err(err) => {
                        debug!(path = %path.display(), error = %err, "content document unavailable");
                        return None;
                    }
                };
                match serde_json::from_str(&raw) {
                    Ok(doc) => Some(doc),
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "content document unparsable");
                        None
                    }
                }
            }
            ContentSource::Http { base_url } => {
                let url = format!("{}/{}", base_url.trim_end_matches('/'), name);
                let response = match self.client.get(&url).send().await {
                    Ok(response) => response,
                    Err(err) => {
                        warn!(%url, error = %err, "content fetch failed");
                        return None;
                    }
                };
                if !response.status().is_success() {
                    warn!(%url, status = %response.status(), "content fetch returned non-success");
                    return None;
                }
                match response.json::<Value>().await {
                    Ok(doc) => Some(doc),
                    Err(err) => {
                        warn!(%url, error = %err, "content document unparsable");
                        None
                    }
                }
            }
        }
    }
}

/// Region identifiers travel into file names and URLs; anything beyond
/// lowercase alphanumerics and hyphens is rejected.
fn valid_region(region: &str) -> bool {
    !region.is_empty()
        && region
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

/// Current catalog plus the generation counter that serializes refreshes.
///
/// Each refresh takes a token before its load starts; a finished load
/// installs only while its token is still the newest one handed out, so a
/// response to a superseded region change can never clobber a newer one.
pub struct CatalogStore {
    inner: RwLock<StoreInner>,
    next_token: AtomicU64,
}

struct StoreInner {
    token: u64,
    region: String,
    catalog: Arc<Catalog>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                token: 0,
                region: GLOBAL_REGION.to_string(),
                catalog: Arc::new(catalog),
            }),
            next_token: AtomicU64::new(0),
        }
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.inner.read().catalog.clone()
    }

    pub fn region(&self) -> String {
        self.inner.read().region.clone()
    }

    pub fn begin_refresh(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn install(&self, token: u64, region: &str, catalog: Catalog) -> bool {
        let mut inner = self.inner.write();
        let newest = self.next_token.load(Ordering::SeqCst);
        if token != newest || token <= inner.token {
            return false;
        }
        inner.token = token;
        inner.region = region.trim().to_ascii_lowercase();
        inner.catalog = Arc::new(catalog);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_doc(dir: &std::path::Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn builtin_source_yields_default_catalog() {
        let loader = ContentLoader::new(ContentSource::BuiltIn);
        let catalog = loader.load(GLOBAL_REGION).await;
        assert_eq!(&catalog, default_catalog());
    }

    #[tokio::test]
    async fn missing_global_document_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ContentLoader::new(ContentSource::Dir(dir.path().to_path_buf()));
        let catalog = loader.load(GLOBAL_REGION).await;
        assert_eq!(&catalog, default_catalog());
    }

    #[tokio::test]
    async fn malformed_global_document_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        write_doc(dir.path(), "content.global.json", "{ not json");
        let loader = ContentLoader::new(ContentSource::Dir(dir.path().to_path_buf()));
        let catalog = loader.load(GLOBAL_REGION).await;
        assert_eq!(&catalog, default_catalog());
    }

    #[tokio::test]
    async fn region_override_replaces_named_subject_only() {
        let dir = tempfile::tempdir().unwrap();
        write_doc(
            dir.path(),
            "content.uk.json",
            r#"{
                "h": {
                    "subjects": {
                        "History": [
                            { "t": "British Library - Learning", "u": "https://www.bl.uk/learning", "d": "Primary sources (UK)." }
                        ]
                    }
                }
            }"#,
        );
        let loader = ContentLoader::new(ContentSource::Dir(dir.path().to_path_buf()));
        let catalog = loader.load("uk").await;
        assert_eq!(
            catalog.h.subjects["Maths"],
            default_catalog().h.subjects["Maths"]
        );
        let history = &catalog.h.subjects["History"];
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title, "British Library - Learning");
    }

    #[tokio::test]
    async fn missing_region_document_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ContentLoader::new(ContentSource::Dir(dir.path().to_path_buf()));
        let catalog = loader.load("nz").await;
        assert_eq!(&catalog, default_catalog());
    }

    #[tokio::test]
    async fn hostile_region_identifier_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ContentLoader::new(ContentSource::Dir(dir.path().to_path_buf()));
        let catalog = loader.load("../../etc/passwd").await;
        assert_eq!(&catalog, default_catalog());
    }

    #[test]
    fn store_rejects_superseded_install() {
        let store = CatalogStore::new(default_catalog().clone());
        let first = store.begin_refresh();
        let second = store.begin_refresh();
        assert!(store.install(second, "uk", default_catalog().clone()));
        assert!(!store.install(first, "us", default_catalog().clone()));
        assert_eq!(store.region(), "uk");
    }

    #[test]
    fn store_rejects_replayed_token() {
        let store = CatalogStore::new(default_catalog().clone());
        let token = store.begin_refresh();
        assert!(store.install(token, "au", default_catalog().clone()));
        assert!(!store.install(token, "au", default_catalog().clone()));
    }

    #[tokio::test]
    async fn refresh_installs_latest_only() {
        let dir = tempfile::tempdir().unwrap();
        write_doc(
            dir.path(),
            "content.uk.json",
            r#"{ "h": { "label": "Secondary", "subjects": {} } }"#,
        );
        let loader = ContentLoader::new(ContentSource::Dir(dir.path().to_path_buf()));
        let store = CatalogStore::new(default_catalog().clone());

        // A slow load that began earlier must not overwrite a newer one.
        let stale_token = store.begin_refresh();
        assert!(loader.refresh(&store, "uk").await);
        let stale_catalog = loader.load(GLOBAL_REGION).await;
        assert!(!store.install(stale_token, GLOBAL_REGION, stale_catalog));

        assert_eq!(store.region(), "uk");
        assert_eq!(store.catalog().h.label, "Secondary");
    }
}
