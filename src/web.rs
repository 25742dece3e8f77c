use crate::catalog::{Catalog, LevelCode, LinkItem};
use crate::filter::visible_items;
use crate::loader::{CatalogStore, ContentLoader, ContentSource, GLOBAL_REGION};
use crate::state::{
    Bootstrap, DEFAULT_LANGUAGE, DEFAULT_REGION, SelectionEvent, SelectionState, ad_free_flag,
};
use crate::strings::{self, LANGUAGES, UiStrings};
use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use cookie::Cookie;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

type SharedState = Arc<AppState>;

const BRAND: &str = "IdleRise • DTG";
const AD_FREE_COOKIE: &str = "dtg_adfree";
const AD_FREE_COOKIE_MAX_AGE_DAYS: i64 = 365;
const FAVICON_SIZE: u32 = 128;

/// Region selector options, in display order. The id doubles as the override
/// document suffix (`content.{id}.json`).
const REGIONS: &[(&str, &str)] = &[
    ("global", "Global"),
    ("us", "United States"),
    ("uk", "United Kingdom"),
    ("eu", "Europe"),
    ("ca", "Canada"),
    ("au", "Australia"),
    ("in", "India"),
    ("sg", "Singapore"),
    ("za", "South Africa"),
    ("nz", "New Zealand"),
];

pub struct AppState {
    pub loader: ContentLoader,
    pub store: CatalogStore,
    pub theme: WebTheme,
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum WebTheme {
    #[default]
    Tailwind,
    Bootstrap,
}

impl fmt::Display for WebTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebTheme::Tailwind => write!(f, "tailwind"),
            WebTheme::Bootstrap => write!(f, "bootstrap"),
        }
    }
}

impl FromStr for WebTheme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "tailwind" => Ok(WebTheme::Tailwind),
            "bootstrap" => Ok(WebTheme::Bootstrap),
            other => Err(format!("unknown theme {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Chrome {
    use_tailwind: bool,
    use_bootstrap: bool,
    body_class: &'static str,
    main_class: &'static str,
    shell_class: &'static str,
    eyebrow_class: &'static str,
    headline_class: &'static str,
    tab_class: &'static str,
    tab_active_class: &'static str,
    pill_class: &'static str,
    pill_active_class: &'static str,
    card_class: &'static str,
    input_class: &'static str,
    ad_slot_class: &'static str,
}

impl Chrome {
    fn new(theme: WebTheme) -> Self {
        match theme {
            WebTheme::Tailwind => Self {
                use_tailwind: true,
                use_bootstrap: false,
                body_class: "bg-gradient-to-b from-indigo-50 to-sky-100 text-neutral-900",
                main_class: "min-h-screen",
                shell_class: "max-w-6xl mx-auto px-4 py-6 space-y-5",
                eyebrow_class: "uppercase tracking-wider text-xs text-neutral-500",
                headline_class: "text-lg font-bold leading-tight",
                tab_class: "px-4 h-10 inline-flex items-center rounded-xl text-sm font-medium border bg-white/60 text-neutral-700 border-neutral-200 hover:border-neutral-400",
                tab_active_class: "px-4 h-10 inline-flex items-center rounded-xl text-sm font-medium border bg-neutral-900 text-white border-neutral-900",
                pill_class: "px-3 py-1.5 rounded-full text-sm border bg-white/60 text-neutral-700 border-neutral-200 hover:border-neutral-400",
                pill_active_class: "px-3 py-1.5 rounded-full text-sm border bg-neutral-900 text-white border-neutral-900",
                card_class: "block rounded-2xl border border-neutral-200 hover:border-neutral-300 p-4 shadow-sm hover:shadow-md bg-white/70",
                input_class: "h-11 px-3 rounded-xl border border-neutral-200 bg-white/70 text-sm w-full",
                ad_slot_class: "h-32 rounded-2xl border border-dashed border-neutral-300 flex items-center justify-center text-sm text-neutral-500",
            },
            WebTheme::Bootstrap => Self {
                use_tailwind: false,
                use_bootstrap: true,
                body_class: "bg-light text-dark",
                main_class: "",
                shell_class: "container py-4",
                eyebrow_class: "text-uppercase text-muted small",
                headline_class: "h5 fw-bold mb-0",
                tab_class: "btn btn-outline-secondary btn-sm",
                tab_active_class: "btn btn-dark btn-sm",
                pill_class: "btn btn-outline-secondary btn-sm rounded-pill",
                pill_active_class: "btn btn-dark btn-sm rounded-pill",
                card_class: "card card-body h-100 shadow-sm",
                input_class: "form-control",
                ad_slot_class: "border border-2 rounded d-flex align-items-center justify-content-center text-muted p-5",
            },
        }
    }
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub theme: WebTheme,
    pub base_url: String,
    pub source: ContentSource,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            theme: WebTheme::default(),
            base_url: "http://127.0.0.1:8080".to_string(),
            source: ContentSource::BuiltIn,
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    let loader = ContentLoader::new(config.source.clone());
    let catalog = loader.load(GLOBAL_REGION).await;
    let state = Arc::new(AppState {
        loader,
        store: CatalogStore::new(catalog),
        theme: config.theme,
        base_url: config.base_url.clone(),
    });
    let router = build_router(state);
    info!(
        %config.addr,
        theme = ?config.theme,
        base = %config.base_url,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(directory_html))
        .route("/api/catalog", get(api_catalog))
        .route("/api/links", get(api_links))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[derive(Debug, Deserialize)]
struct DirectoryParams {
    level: Option<String>,
    subject: Option<String>,
    q: Option<String>,
    region: Option<String>,
    lang: Option<String>,
    adfree: Option<String>,
}

async fn directory_html(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<DirectoryParams>,
) -> Response {
    let cookie_ad_free = ad_free_from_cookies(&headers);
    let param_ad_free = params.adfree.as_deref().map(ad_free_flag);

    let region = params
        .region
        .as_deref()
        .map(|raw| raw.trim().to_ascii_lowercase())
        .filter(|raw| !raw.is_empty())
        .unwrap_or_else(|| state.store.region());
    if region != state.store.region() {
        state.loader.refresh(&state.store, &region).await;
    }
    let catalog = state.store.catalog();

    let boot = Bootstrap {
        hostname: request_hostname(&headers),
        region: Some(region),
        language: params.lang.clone(),
        ad_free: param_ad_free.unwrap_or(cookie_ad_free),
    };
    let mut sel = SelectionState::initial(&catalog, &boot);
    if let Some(level) = params
        .level
        .as_deref()
        .and_then(|raw| raw.parse::<LevelCode>().ok())
    {
        sel = sel.apply(&SelectionEvent::SelectLevel(level), &catalog);
    }
    if let Some(subject) = params.subject.clone() {
        sel = sel.apply(&SelectionEvent::SelectSubject(subject), &catalog);
    }
    if let Some(query) = params.q.clone() {
        sel = sel.apply(&SelectionEvent::SetQuery(query), &catalog);
    }

    let template = DirectoryTemplate::build(&catalog, &sel, state.theme);
    let mut response = match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("template error: {err}"),
        )
            .into_response(),
    };
    if let Some(value) = param_ad_free.filter(|value| *value != cookie_ad_free) {
        if let Ok(header_value) = HeaderValue::from_str(&ad_free_set_cookie(value)) {
            response
                .headers_mut()
                .insert(header::SET_COOKIE, header_value);
        }
    }
    response
}

async fn api_catalog(State(state): State<SharedState>) -> Json<CatalogPayload> {
    Json(CatalogPayload {
        region: state.store.region(),
        catalog: (*state.store.catalog()).clone(),
    })
}

async fn api_links(
    State(state): State<SharedState>,
    Query(params): Query<LinksParams>,
) -> Result<Json<LinksPayload>, ApiError> {
    let level = match params.level.as_deref() {
        Some(raw) => raw.parse::<LevelCode>().map_err(ApiError::bad_request)?,
        None => LevelCode::H,
    };
    let subject = params
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|subject| !subject.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter `subject` is required"))?
        .to_string();
    let query = params.q.unwrap_or_default();
    let catalog = state.store.catalog();
    let results: Vec<LinkPayload> = visible_items(&catalog, level, &subject, &query)
        .into_iter()
        .map(LinkPayload::from_item)
        .collect();
    Ok(Json(LinksPayload {
        level,
        subject,
        query,
        count: results.len(),
        results,
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "dtg-directory-web" }))
}

#[derive(Debug, Deserialize)]
struct LinksParams {
    level: Option<String>,
    subject: Option<String>,
    q: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct CatalogPayload {
    region: String,
    catalog: Catalog,
}

#[derive(Debug, Clone, Serialize)]
struct LinkPayload {
    key: String,
    title: String,
    url: String,
    host: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

impl LinkPayload {
    fn from_item(item: &LinkItem) -> Self {
        Self {
            key: item.key(),
            title: item.title.clone(),
            url: item.url.clone(),
            host: host_of(&item.url).to_string(),
            description: item.description.clone(),
            image: item.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct LinksPayload {
    level: LevelCode,
    subject: String,
    query: String,
    count: usize,
    results: Vec<LinkPayload>,
}

struct NavLink {
    label: String,
    href: String,
    active: bool,
}

struct OptionView {
    id: &'static str,
    label: &'static str,
    selected: bool,
}

struct CardView {
    key: String,
    title: String,
    url: String,
    host: String,
    description: String,
    thumb: String,
}

impl CardView {
    fn from_item(item: &LinkItem) -> Self {
        Self {
            key: item.key(),
            title: item.title.clone(),
            url: item.url.clone(),
            host: host_of(&item.url).to_string(),
            description: item.description.clone(),
            thumb: item
                .image
                .clone()
                .unwrap_or_else(|| favicon_url(&item.url, FAVICON_SIZE)),
        }
    }
}

impl DirectoryTemplate {
    fn build(catalog: &Catalog, sel: &SelectionState, theme: WebTheme) -> Self {
        let tabs = catalog
            .levels()
            .iter()
            .map(|(code, level)| NavLink {
                label: level.label.clone(),
                href: directory_href(
                    &sel.apply(&SelectionEvent::SelectLevel(*code), catalog),
                    None,
                ),
                active: *code == sel.level,
            })
            .collect();
        let pills = catalog
            .level(sel.level)
            .subjects
            .keys()
            .map(|subject| NavLink {
                label: subject.clone(),
                href: directory_href(
                    &sel.apply(&SelectionEvent::SelectSubject(subject.clone()), catalog),
                    None,
                ),
                active: *subject == sel.subject,
            })
            .collect();
        let cards = visible_items(catalog, sel.level, &sel.subject, &sel.query)
            .into_iter()
            .map(CardView::from_item)
            .collect();
        let regions = REGIONS
            .iter()
            .copied()
            .map(|(id, label)| OptionView {
                id,
                label,
                selected: id == sel.region,
            })
            .collect();
        let languages = LANGUAGES
            .iter()
            .copied()
            .map(|(id, label)| OptionView {
                id,
                label,
                selected: id == sel.language,
            })
            .collect();
        DirectoryTemplate {
            chrome: Chrome::new(theme),
            strings: strings::for_language(&sel.language),
            brand: BRAND,
            level: sel.level.as_str(),
            subject: sel.subject.clone(),
            query: sel.query.clone(),
            ad_free: sel.ad_free,
            ad_free_href: directory_href(sel, Some(!sel.ad_free)),
            tabs,
            pills,
            cards,
            regions,
            languages,
        }
    }
}

/// Rebuilds the canonical `/` URL for a selection; used for tab, pill, and
/// toggle links so every control round-trips the whole selection.
fn directory_href(sel: &SelectionState, ad_free: Option<bool>) -> String {
    let mut query = vec![
        format!("level={}", sel.level),
        format!("subject={}", encode_component(&sel.subject)),
    ];
    if !sel.query.is_empty() {
        query.push(format!("q={}", encode_component(&sel.query)));
    }
    if sel.region != DEFAULT_REGION {
        query.push(format!("region={}", encode_component(&sel.region)));
    }
    if sel.language != DEFAULT_LANGUAGE {
        query.push(format!("lang={}", encode_component(&sel.language)));
    }
    if let Some(flag) = ad_free {
        query.push(format!("adfree={}", if flag { "1" } else { "0" }));
    }
    format!("/?{}", query.join("&"))
}

fn request_hostname(headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .split(':')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn ad_free_from_cookies(headers: &HeaderMap) -> bool {
    let Some(raw) = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    Cookie::split_parse(raw)
        .filter_map(Result::ok)
        .any(|cookie| cookie.name() == AD_FREE_COOKIE && cookie.value() == "true")
}

fn ad_free_set_cookie(value: bool) -> String {
    Cookie::build((AD_FREE_COOKIE, if value { "true" } else { "false" }))
        .path("/")
        .max_age(cookie::time::Duration::days(AD_FREE_COOKIE_MAX_AGE_DAYS))
        .build()
        .to_string()
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Best-effort hostname extraction for card footers and favicon lookups.
fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    rest.split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .split(':')
        .next()
        .unwrap_or_default()
}

fn favicon_url(url: &str, size: u32) -> String {
    format!(
        "https://www.google.com/s2/favicons?domain={}&sz={}",
        encode_component(host_of(url)),
        size
    )
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{{ brand }} • Curated Links</title>
    {% if chrome.use_tailwind %}
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
    {% endif %}
    {% if chrome.use_bootstrap %}
    <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.8/dist/css/bootstrap.min.css" rel="stylesheet" integrity="sha384-sRIl4kxILFvY47J16cr9ZwB07vP4J8+LH7qKQnuqkuIAvNWLzeN8tE5YBujZqJLB" crossorigin="anonymous">
    <script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.8/dist/js/bootstrap.bundle.min.js" integrity="sha384-FKyoEForCGlyvwx9Hj09JcYn3nv7wiPVlz7YYwJrWVcXK/BmnVDxM+D2scQbITxI" crossorigin="anonymous"></script>
    {% endif %}
  </head>
  <body class="{{ chrome.body_class }}">
    <main class="{{ chrome.main_class }}">
      <div class="{{ chrome.shell_class }}">
        <header class="flex items-center justify-between d-flex justify-content-between">
          <div>
            <p class="{{ chrome.eyebrow_class }}">Downtime Games</p>
            <h1 class="{{ chrome.headline_class }}">{{ brand }}</h1>
          </div>
          <a href="{{ ad_free_href }}" class="{{ chrome.pill_class }}">
            {{ strings.ad_free }}:
            {% if ad_free %}on{% else %}off{% endif %}
          </a>
        </header>

        <nav class="flex flex-wrap gap-2 d-flex flex-wrap" aria-label="Education level">
          {% for tab in tabs %}
          <a href="{{ tab.href }}" class="{% if tab.active %}{{ chrome.tab_active_class }}{% else %}{{ chrome.tab_class }}{% endif %}">{{ tab.label }}</a>
          {% endfor %}
        </nav>

        <nav class="flex flex-wrap gap-2 mt-2 d-flex flex-wrap" aria-label="Subject">
          {% for pill in pills %}
          <a href="{{ pill.href }}" class="{% if pill.active %}{{ chrome.pill_active_class }}{% else %}{{ chrome.pill_class }}{% endif %}">{{ pill.label }}</a>
          {% endfor %}
        </nav>

        <form method="get" action="/" class="grid grid-cols-1 md:grid-cols-4 gap-3 row g-2">
          <input type="hidden" name="level" value="{{ level }}" />
          <input type="hidden" name="subject" value="{{ subject }}" />
          <input
            type="search"
            name="q"
            value="{{ query }}"
            placeholder="{{ strings.search_placeholder }}"
            class="{{ chrome.input_class }}"
          />
          <select name="region" class="{{ chrome.input_class }}" aria-label="Select region">
            {% for region in regions %}
            <option value="{{ region.id }}"{% if region.selected %} selected{% endif %}>{{ region.label }}</option>
            {% endfor %}
          </select>
          <select name="lang" class="{{ chrome.input_class }}" aria-label="Select language">
            {% for language in languages %}
            <option value="{{ language.id }}"{% if language.selected %} selected{% endif %}>{{ language.label }}</option>
            {% endfor %}
          </select>
          <button type="submit" class="{{ chrome.tab_class }}">Go</button>
        </form>

        <h2 class="sr-only visually-hidden">Links</h2>
        {% if cards.len() == 0 %}
        <p>No links matched this search.</p>
        {% else %}
        <div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-3 gap-5 row row-cols-1 row-cols-md-3 g-3">
          {% for card in cards %}
          <a id="{{ card.key }}" href="{{ card.url }}" target="_blank" rel="noopener noreferrer" class="{{ chrome.card_class }}">
            <div class="flex items-start gap-4 d-flex gap-3">
              <img src="{{ card.thumb }}" alt="" loading="lazy" width="56" height="56" class="rounded-xl object-cover" />
              <div>
                <h3 class="text-base font-semibold leading-snug h6">{{ card.title }}</h3>
                <p class="mt-1 text-sm text-neutral-600 small">{{ card.description }}</p>
                <p class="mt-2 text-xs text-neutral-500 small text-muted">{{ card.host }}</p>
              </div>
            </div>
          </a>
          {% endfor %}
        </div>
        {% endif %}

        {% if !ad_free %}
        <div class="grid grid-cols-1 sm:grid-cols-2 gap-4 mt-6 row row-cols-1 row-cols-md-2 g-3">
          <div class="{{ chrome.ad_slot_class }}">Ad slot 300×250</div>
          <div class="{{ chrome.ad_slot_class }}">Ad slot 300×250</div>
        </div>
        {% endif %}

        <footer class="border-t border-neutral-200 pt-4 mt-6 text-sm text-neutral-600 d-flex justify-content-between">
          <span>{{ brand }} • Built for school-safe downtime</span>
          <span>
            <a href='#' class="underline">{{ strings.privacy }}</a>
            •
            <a href='#' class="underline">{{ strings.contact }}</a>
          </span>
        </footer>
      </div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct DirectoryTemplate {
    chrome: Chrome,
    strings: &'static UiStrings,
    brand: &'static str,
    level: &'static str,
    subject: String,
    query: String,
    ad_free: bool,
    ad_free_href: String,
    tabs: Vec<NavLink>,
    pills: Vec<NavLink>,
    cards: Vec<CardView>,
    regions: Vec<OptionView>,
    languages: Vec<OptionView>,
}

#[cfg(all(test, feature = "web"))]
mod tests {
    use super::*;
    use crate::default_catalog;
    use axum::{body, body::Body, http::Request};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let state = Arc::new(AppState {
            loader: ContentLoader::new(ContentSource::BuiltIn),
            store: CatalogStore::new(default_catalog().clone()),
            theme: WebTheme::Tailwind,
            base_url: "http://127.0.0.1:8080".to_string(),
        });
        build_router(state)
    }

    async fn body_text(response: Response) -> String {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn directory_renders_default_selection() {
        let router = test_router();
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
        let html = body_text(response).await;
        assert!(html.contains("Kindergarten"));
        assert!(html.contains("High School"));
        assert!(html.contains("PhET Simulations"));
        assert!(html.contains("Ad slot"));
    }

    #[tokio::test]
    async fn host_header_selects_level() {
        let router = test_router();
        let response = router
            .oneshot(
                Request::get("/")
                    .header("host", "k.downtimegames.example:8080")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Sid the Science Kid"));
    }

    #[tokio::test]
    async fn query_param_filters_cards() {
        let router = test_router();
        let response = router
            .oneshot(
                Request::get("/?level=h&subject=Science&q=phet")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("PhET Simulations"));
        assert!(!html.contains("ChemCollective"));
    }

    #[tokio::test]
    async fn adfree_param_sets_cookie_and_hides_ads() {
        let router = test_router();
        let response = router
            .oneshot(Request::get("/?adfree=1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(set_cookie.starts_with("dtg_adfree=true"));
        let html = body_text(response).await;
        assert!(!html.contains("Ad slot"));
    }

    #[tokio::test]
    async fn adfree_cookie_is_honored_without_param() {
        let router = test_router();
        let response = router
            .oneshot(
                Request::get("/")
                    .header("cookie", "dtg_adfree=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let html = body_text(response).await;
        assert!(!html.contains("Ad slot"));
    }

    #[tokio::test]
    async fn api_links_filters_case_insensitively() {
        let router = test_router();
        let response = router
            .oneshot(
                Request::get("/api/links?level=h&subject=Science&q=PHET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
        let payload: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(payload["count"], 2);
        assert_eq!(payload["results"][0]["title"], "PhET Simulations");
    }

    #[tokio::test]
    async fn api_links_unknown_subject_is_empty_not_error() {
        let router = test_router();
        let response = router
            .oneshot(
                Request::get("/api/links?level=h&subject=NoSuchSubject")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
        let payload: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(payload["count"], 0);
    }

    #[tokio::test]
    async fn api_links_requires_subject() {
        let router = test_router();
        let response = router
            .oneshot(
                Request::get("/api/links?level=h")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn api_links_rejects_unknown_level() {
        let router = test_router();
        let response = router
            .oneshot(
                Request::get("/api/links?level=x&subject=Science")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn api_catalog_reports_region() {
        let router = test_router();
        let response = router
            .oneshot(Request::get("/api/catalog").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
        let payload: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(payload["region"], "global");
        assert!(payload["catalog"]["h"]["subjects"]["Science"].is_array());
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let router = test_router();
        let response = router
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
        let payload: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(payload["status"], "ok");
    }

    #[test]
    fn host_of_handles_paths_and_ports() {
        assert_eq!(
            host_of("https://phet.colorado.edu/en/sims"),
            "phet.colorado.edu"
        );
        assert_eq!(host_of("http://localhost:8080/x"), "localhost");
        assert_eq!(host_of("not-a-url"), "not-a-url");
    }

    #[test]
    fn directory_href_round_trips_selection() {
        let catalog = default_catalog();
        let sel = SelectionState::initial(catalog, &Bootstrap::default());
        assert_eq!(directory_href(&sel, None), "/?level=h&subject=Science");
        let sel = sel.apply(&SelectionEvent::SelectRegion("uk".to_string()), catalog);
        let sel = sel.apply(&SelectionEvent::SetQuery("phet".to_string()), catalog);
        assert_eq!(
            directory_href(&sel, Some(true)),
            "/?level=h&subject=Science&q=phet&region=uk&adfree=1"
        );
    }
}
