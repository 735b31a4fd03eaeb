//! Web search through DuckDuckGo's HTML results page
//!
//! The page is fetched through [`Fetcher`] like any other URL, so search
//! results are cached too. Extraction only looks at `a.result__a` anchors.

use crate::client::Fetcher;
use crate::error::FetchError;
use crate::types::{FetchRequest, SearchResult};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// HTML search endpoint; the query goes in `q`
pub const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Maximum number of results extracted from a page
pub const MAX_RESULTS: usize = 10;

const RESULT_LINK_SELECTOR: &str = "a.result__a";

/// Build the search URL for free-form terms
///
/// Terms are split on whitespace, form-encoded individually and joined
/// with `+`.
pub fn search_url(terms: &str) -> String {
    search_url_at(SEARCH_ENDPOINT, terms)
}

/// Build the search URL for `terms` against another results endpoint
pub fn search_url_at(endpoint: &str, terms: &str) -> String {
    let query = terms
        .split_whitespace()
        .map(|term| url::form_urlencoded::byte_serialize(term.as_bytes()).collect::<String>())
        .collect::<Vec<_>>()
        .join("+");
    format!("{}?q={}", endpoint, query)
}

/// Extract up to `limit` results from a results page
pub fn extract_results(html: &str, limit: usize) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let Ok(selector) = Selector::parse(RESULT_LINK_SELECTOR) else {
        return Vec::new();
    };

    doc.select(&selector)
        .filter_map(|link| {
            let title = link.text().collect::<String>();
            let title = collapse_spaces(title.trim());
            let href = link.value().attr("href")?.trim();
            if title.is_empty() || href.is_empty() {
                return None;
            }
            Some((title, absolutize(href)))
        })
        .take(limit)
        .enumerate()
        .map(|(i, (title, url))| SearchResult {
            index: i + 1,
            title,
            url,
        })
        .collect()
}

/// Upgrade protocol-relative links and resolve site-relative ones
fn absolutize(href: &str) -> String {
    if href.starts_with("//") {
        return format!("https:{}", href);
    }
    if href.starts_with('/') {
        if let Ok(joined) = Url::parse(SEARCH_ENDPOINT).and_then(|base| base.join(href)) {
            return joined.to_string();
        }
    }
    href.to_string()
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Search for `terms` and return the top results
///
/// With `use_cache` off the results page is neither read from nor written
/// to the disk cache.
pub async fn search(
    fetcher: &Fetcher,
    terms: &str,
    use_cache: bool,
) -> Result<Vec<SearchResult>, FetchError> {
    search_at(fetcher, SEARCH_ENDPOINT, terms, use_cache).await
}

/// Search against a DuckDuckGo-compatible HTML endpoint
pub async fn search_at(
    fetcher: &Fetcher,
    endpoint: &str,
    terms: &str,
    use_cache: bool,
) -> Result<Vec<SearchResult>, FetchError> {
    let url = search_url_at(endpoint, terms);
    debug!(url = %url, use_cache, "Searching");
    let page = fetcher
        .fetch(&FetchRequest::new(url).use_cache(use_cache))
        .await?;
    let results = extract_results(&page, MAX_RESULTS);
    debug!(count = results.len(), "Extracted search results");
    Ok(results)
}
