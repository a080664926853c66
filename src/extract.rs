use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = "image-extractor-api/1.0";

/// Extensions accepted by the classifier, matched case-insensitively against
/// the URL path after query/fragment stripping.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "ico", "svg"];

/// Narrower list applied to `url(...)` candidates found in style attributes.
const STYLE_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

// ── Lazy static regexes ──────────────────────────────────────────────────────

static IMAGE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^https?://.+\.(?:{})$",
        IMAGE_EXTENSIONS.join("|")
    ))
    .unwrap()
});

static STYLE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)url\(\s*['"]?([^'"()]+?\.(?:{}))['"]?\s*\)"#,
        STYLE_IMAGE_EXTENSIONS.join("|")
    ))
    .unwrap()
});

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("{0}")]
    InvalidUrl(String),
    #[error("Failed to fetch URL: upstream returned status {0}")]
    UpstreamStatus(u16),
    #[error("Network error: {0}")]
    Network(String),
}

// ── HTTP client ──────────────────────────────────────────────────────────────

/// Build the shared outbound client. One instance is created at startup and
/// handed to the request handler; no other state is shared between requests.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .connect_timeout(std::time::Duration::from_secs(5))
        .timeout(std::time::Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .build()
}

// ── Public API ───────────────────────────────────────────────────────────────

pub async fn extract_images(
    client: &reqwest::Client,
    target_url: &str,
) -> Result<Vec<String>, ExtractionError> {
    let base = Url::parse(target_url)
        .map_err(|e| ExtractionError::InvalidUrl(format!("Invalid URL '{}': {}", target_url, e)))?;
    let html = fetch_page(client, &base).await?;
    let urls = scan_document(&html, &base);
    tracing::debug!(url = target_url, count = urls.len(), "extraction finished");
    Ok(urls)
}

// ── HTTP fetch ───────────────────────────────────────────────────────────────

async fn fetch_page(client: &reqwest::Client, url: &Url) -> Result<String, ExtractionError> {
    let response = client.get(url.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractionError::Network(format!("TimeoutError: {}", e))
        } else if e.is_connect() {
            ExtractionError::Network(format!("ConnectError: {}", e))
        } else {
            ExtractionError::Network(format!("RequestError: {}", e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractionError::UpstreamStatus(status.as_u16()));
    }

    response
        .text()
        .await
        .map_err(|e| ExtractionError::Network(e.to_string()))
}

// ── Markup scan ──────────────────────────────────────────────────────────────

/// Walk the document once and collect absolute image URLs from `<img src>`
/// attributes and inline-style `url(...)` references. Malformed attributes
/// contribute nothing; this function does not fail.
pub fn scan_document(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut found: HashSet<String> = HashSet::new();

    let img_sel = Selector::parse("img").unwrap();
    for img in document.select(&img_sel) {
        let src = img.value().attr("src").unwrap_or("").trim();
        if src.is_empty() {
            continue;
        }
        add_candidate(&mut found, base, src);
    }

    let styled_sel = Selector::parse("[style]").unwrap();
    for el in document.select(&styled_sel) {
        let style = el.value().attr("style").unwrap_or("");
        for cap in STYLE_URL_RE.captures_iter(style) {
            add_candidate(&mut found, base, &cap[1]);
        }
    }

    found.into_iter().collect()
}

/// Resolve one candidate against the base URL and keep it if it classifies
/// as an image. Unresolvable references are dropped silently.
fn add_candidate(found: &mut HashSet<String>, base: &Url, candidate: &str) {
    if let Ok(absolute) = base.join(candidate) {
        let absolute = absolute.to_string();
        if is_image_url(&absolute) {
            found.insert(absolute);
        }
    }
}

// ── URL classification ───────────────────────────────────────────────────────

/// Return true iff the absolute URL plausibly names an image resource:
/// after stripping any query string or fragment, the path must end in a
/// recognized extension. Never fails; anything unparseable is simply false.
pub fn is_image_url(url: &str) -> bool {
    let end = url
        .find(|c: char| c == '?' || c == '#')
        .unwrap_or(url.len());
    IMAGE_URL_RE.is_match(&url[..end])
}

// ── Tests ────────────────────────────────────────────────────────────────────
