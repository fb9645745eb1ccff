//! Single-hop, same-site link discovery.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

static ANCHOR_HREF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Deduplicated set of absolute same-site URLs found on a seed page.
pub type LinkSet = BTreeSet<String>;

/// Collect the same-site links of a seed page.
///
/// - `/path` hrefs are appended to `base_url` (without doubling a trailing `/`).
/// - hrefs that already contain `base_url` are kept unchanged.
/// - everything else (other hosts, `//host` hrefs, anchors, `javascript:`,
///   `mailto:`, bare relative paths) is dropped.
///
/// The seed URL itself is never part of the result. Links found on linked
/// pages are not followed.
pub fn discover_links(html: &str, base_url: &str) -> LinkSet {
    let doc = Html::parse_document(html);
    let mut links = LinkSet::new();

    for el in doc.select(&ANCHOR_HREF) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let href = href.trim();

        if let Some(resolved) = resolve_href(href, base_url) {
            links.insert(resolved);
        }
    }

    links.remove(base_url);
    debug!(base_url, count = links.len(), "links discovered");
    links
}

fn resolve_href(href: &str, base_url: &str) -> Option<String> {
    if href.starts_with("//") {
        return None;
    }
    if href.starts_with('/') {
        return Some(format!("{}{href}", base_url.trim_end_matches('/')));
    }
    if href.contains(base_url) {
        return Some(href.to_string());
    }
    None
}
