//! Bounded, non-retrying page retrieval.
//!
//! Every failure mode (DNS, connect, timeout, non-2xx status, unreadable body)
//! comes back as a [`FetchError`] value carrying the URL, so callers can skip
//! the page and keep going.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Node, Selector};
use tracing::{debug, info, instrument, warn};

use sitescout_shared::{Result, SiteScoutError};

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("SiteScout/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: usize = 5;

/// Maximum response size we accept (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// Elements whose text never counts as visible page text.
const HIDDEN_TEXT_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements that start a new run of text. Text from different blocks is
/// separated by a space so sentences never fuse in minified markup.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt",
    "figcaption", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "title", "tr", "ul",
];

static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).expect("valid selector"));

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// A successfully fetched page.
///
/// The HTML is kept as a string (rather than a parsed tree) so pages can move
/// between tasks; consumers re-parse when they need structure.
#[derive(Debug, Clone)]
pub struct Page {
    /// The URL that was requested.
    pub url: String,
    /// HTTP status code of the response.
    pub status: u16,
    /// Raw response body.
    pub html: String,
    /// Concatenated text nodes, excluding script/style content.
    pub text: String,
    /// Content of `<meta name="description">`, if present and non-empty.
    pub description: Option<String>,
}

impl Page {
    /// Build a page from a response body, extracting text and meta description.
    pub fn from_html(url: impl Into<String>, status: u16, html: String) -> Self {
        let doc = Html::parse_document(&html);
        let text = visible_text(&doc);
        let description = doc
            .select(&META_DESCRIPTION)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Self {
            url: url.into(),
            status,
            html,
            text,
            description,
        }
    }
}

/// Collect every text node that is not inside a hidden element.
fn visible_text(doc: &Html) -> String {
    let mut text = String::new();
    let mut last_block = None;

    'nodes: for node in doc.root_element().descendants() {
        let Node::Text(t) = node.value() else {
            continue;
        };

        let mut block = None;
        for ancestor in node.ancestors() {
            let Some(el) = ancestor.value().as_element() else {
                continue;
            };
            if HIDDEN_TEXT_TAGS.contains(&el.name()) {
                continue 'nodes;
            }
            if block.is_none() && BLOCK_TAGS.contains(&el.name()) {
                block = Some(ancestor.id());
            }
        }

        if block != last_block && !text.is_empty() && !text.ends_with(char::is_whitespace) {
            text.push(' ');
        }
        last_block = block;
        text.push_str(t);
    }

    text
}

// ---------------------------------------------------------------------------
// FetchError
// ---------------------------------------------------------------------------

/// Why a fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    /// Connection, DNS, TLS, or malformed URL.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request exceeded the configured timeout.
    #[error("timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("HTTP {0}")]
    Status(u16),

    /// The body could not be read or was too large.
    #[error("body error: {0}")]
    Body(String),
}

/// A failed page retrieval, tagged with the URL that failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to retrieve {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchFailure,
}

impl FetchError {
    fn new(url: &str, cause: FetchFailure) -> Self {
        Self {
            url: url.to_string(),
            cause,
        }
    }

    fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        let cause = if err.is_timeout() {
            FetchFailure::Timeout
        } else {
            FetchFailure::Transport(err.to_string())
        };
        Self::new(url, cause)
    }
}

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

/// HTTP page fetcher. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    max_body_bytes: u64,
}

impl PageFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| SiteScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_body_bytes: MAX_RESPONSE_SIZE,
        })
    }

    /// Override the response body cap (defaults to 10 MB).
    pub fn with_max_body_size(mut self, bytes: u64) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    /// Fetch one page. Never retries; failures are logged and returned as values.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> std::result::Result<Page, FetchError> {
        let result = self.try_fetch(url).await;

        match &result {
            Ok(page) => {
                debug!(status = page.status, bytes = page.html.len(), "page fetched");
                if let Some(description) = &page.description {
                    info!(%description, "meta description");
                }
            }
            Err(e) => warn!(error = %e.cause, "failed to retrieve page"),
        }

        result
    }

    async fn try_fetch(&self, url: &str) -> std::result::Result<Page, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(url, FetchFailure::Status(status.as_u16())));
        }

        let max = self.max_body_bytes;
        let too_large = |len: u64| {
            FetchError::new(
                url,
                FetchFailure::Body(format!("response too large ({len} bytes, max {max})")),
            )
        };

        if let Some(len) = response.content_length() {
            if len > max {
                return Err(too_large(len));
            }
        }

        // Chunked responses carry no length header; enforce the cap while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::new(url, FetchFailure::Timeout)
            } else {
                FetchError::new(url, FetchFailure::Body(e.to_string()))
            }
        })? {
            let len = (body.len() + chunk.len()) as u64;
            if len > max {
                return Err(too_large(len));
            }
            body.extend_from_slice(&chunk);
        }

        let html = String::from_utf8_lossy(&body).into_owned();
        Ok(Page::from_html(url, status.as_u16(), html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> PageFetcher {
        PageFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn page_text_skips_scripts_and_styles() {
        let html = r#"<html><head><title>Acme</title><style>body { color: red; }</style></head>
            <body><p>Jane Doe founded Acme.</p><script>var ceo = "nobody";</script></body></html>"#;
        let page = Page::from_html("https://acme.test/", 200, html.to_string());

        assert!(page.text.contains("Jane Doe founded Acme."));
        assert!(page.text.contains("Acme"));
        assert!(!page.text.contains("color: red"));
        assert!(!page.text.contains("nobody"));
    }

    #[test]
    fn page_text_separates_adjacent_blocks() {
        let html = "<html><body><p>We sell widgets.</p><p>Jane founded Acme.</p>\
                    <div>Say <b>hello</b>.</div></body></html>";
        let page = Page::from_html("https://acme.test/", 200, html.to_string());
        assert_eq!(page.text, "We sell widgets. Jane founded Acme. Say hello.");
    }

    #[test]
    fn page_reads_meta_description() {
        let html = r#"<html><head><meta name="description" content=" Smart music lessons. "></head><body></body></html>"#;
        let page = Page::from_html("https://acme.test/", 200, html.to_string());
        assert_eq!(page.description.as_deref(), Some("Smart music lessons."));

        let bare = Page::from_html("https://acme.test/", 200, "<p>hi</p>".to_string());
        assert!(bare.description.is_none());
    }

    #[tokio::test]
    async fn fetch_success() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/about"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("<html><body><h1>About us</h1></body></html>"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/about", server.uri());
        let page = fetcher().fetch(&url).await.expect("fetch ok");
        assert_eq!(page.status, 200);
        assert_eq!(page.url, url);
        assert!(page.text.contains("About us"));
    }

    #[tokio::test]
    async fn fetch_non_success_status_is_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/missing"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let err = fetcher().fetch(&url).await.unwrap_err();
        assert_eq!(err.url, url);
        assert_eq!(err.cause, FetchFailure::Status(404));
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/huge"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("x".repeat(64)))
            .mount(&server)
            .await;

        let err = fetcher()
            .with_max_body_size(16)
            .fetch(&format!("{}/huge", server.uri()))
            .await
            .unwrap_err();
        match err.cause {
            FetchFailure::Body(msg) => assert!(msg.contains("too large"), "{msg}"),
            other => panic!("expected Body failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_timeout_is_reported() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/slow"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(Duration::from_millis(200)).unwrap();
        let err = fetcher
            .fetch(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.cause, FetchFailure::Timeout);
    }

    #[tokio::test]
    async fn fetch_unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let err = fetcher().fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(
            err.cause,
            FetchFailure::Transport(_) | FetchFailure::Timeout
        ));
    }

    #[tokio::test]
    async fn fetch_malformed_url_is_transport_error() {
        let err = fetcher().fetch("not a url").await.unwrap_err();
        assert!(matches!(err.cause, FetchFailure::Transport(_)));
    }
}
