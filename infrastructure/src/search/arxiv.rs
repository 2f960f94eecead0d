//! arXiv search over the public Atom API.
//!
//! The feed is small and regular, so entries are picked apart with plain
//! string scanning rather than a full XML parser.

use async_trait::async_trait;
use litreview_application::ports::literature_search::{
    LiteratureSearch, SearchError, SearchResults,
};
use litreview_domain::{Paper, SearchFilters, SortOrder};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

pub const ARXIV_API_BASE: &str = "https://export.arxiv.org/api/query";
const USER_AGENT: &str = concat!("litreview/", env!("CARGO_PKG_VERSION"));

/// arXiv asks clients to leave three seconds between calls.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(3);

/// [`LiteratureSearch`] backed by the arXiv API
pub struct ArxivSearch {
    client: reqwest::Client,
    base_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl ArxivSearch {
    pub fn new() -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SearchError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: ARXIV_API_BASE.to_string(),
            min_interval: MIN_REQUEST_INTERVAL,
            last_request: Mutex::new(None),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Sleep until `min_interval` has passed since the previous request.
    async fn rate_limit(&self) {
        let wait = {
            let last = self.last_request.lock().unwrap_or_else(|e| e.into_inner());
            last.map(|instant| instant.elapsed())
                .filter(|elapsed| *elapsed < self.min_interval)
                .map(|elapsed| self.min_interval - elapsed)
        };

        if let Some(wait) = wait {
            debug!("Waiting {:?} before the next arXiv request", wait);
            tokio::time::sleep(wait).await;
        }

        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
    }

    async fn fetch(
        &self,
        query: &str,
        max_results: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<Paper>, SearchError> {
        self.rate_limit().await;

        let (sort_by, sort_order) = match filters.sort {
            SortOrder::Relevance => ("relevance", "descending"),
            SortOrder::Newest => ("submittedDate", "descending"),
        };
        let max_results = max_results.to_string();
        let search_query = build_search_query(query, &filters.categories);
        debug!("arXiv query: {}", search_query);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", sort_by),
                ("sortOrder", sort_order),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("arXiv request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http(format!("arXiv returned status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("Failed to read arXiv response: {}", e)))?;

        parse_feed(&body)
    }
}

#[async_trait]
impl LiteratureSearch for ArxivSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        filters: &SearchFilters,
    ) -> SearchResults {
        if query.trim().is_empty() || max_results == 0 {
            return SearchResults::ok(Vec::new());
        }
        match self.fetch(query.trim(), max_results, filters).await {
            Ok(mut papers) => {
                papers.truncate(max_results);
                debug!("arXiv returned {} paper(s) for '{}'", papers.len(), query);
                SearchResults::ok(papers)
            }
            Err(e) => SearchResults::failed(e),
        }
    }
}

/// `all:` search over the query (quoted when it has several words),
/// optionally restricted to any of the given categories.
pub(crate) fn build_search_query(query: &str, categories: &[String]) -> String {
    let terms = normalize_whitespace(&query.replace('"', ""));
    let mut search_query = if terms.contains(' ') {
        format!("all:\"{}\"", terms)
    } else {
        format!("all:{}", terms)
    };

    let categories: Vec<String> = categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| format!("cat:{}", c))
        .collect();
    match categories.len() {
        0 => {}
        1 => search_query = format!("{} AND {}", search_query, categories[0]),
        _ => search_query = format!("{} AND ({})", search_query, categories.join(" OR ")),
    }
    search_query
}

/// Parse an Atom feed into papers. Entries without an id or title are
/// skipped; an arXiv error entry fails the whole feed.
pub(crate) fn parse_feed(xml: &str) -> Result<Vec<Paper>, SearchError> {
    if !xml.contains("<feed") {
        return Err(SearchError::Parse("response is not an Atom feed".to_string()));
    }

    let mut papers = Vec::new();
    for entry in extract_entries(xml) {
        if let Some(id) = extract_tag_text(entry, "id")
            && id.contains("/api/errors")
        {
            let message = extract_tag_text(entry, "summary").unwrap_or(id);
            return Err(SearchError::Parse(format!(
                "arXiv rejected the query: {}",
                normalize_whitespace(&message)
            )));
        }
        if let Some(paper) = parse_entry(entry) {
            papers.push(paper);
        }
    }
    Ok(papers)
}

/// All `<entry>...</entry>` blocks, in document order.
fn extract_entries(xml: &str) -> Vec<&str> {
    const OPEN: &str = "<entry>";
    const CLOSE: &str = "</entry>";

    let mut entries = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find(OPEN) {
        let Some(len) = rest[start..].find(CLOSE) else {
            break;
        };
        let end = start + len + CLOSE.len();
        entries.push(&rest[start..end]);
        rest = &rest[end..];
    }
    entries
}

/// Every self-closing or opening tag starting with `<{name}`.
fn tags<'a>(xml: &'a str, name: &str) -> Vec<&'a str> {
    let open = format!("<{}", name);
    let mut found = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find(&open) {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let end = start + len + 1;
        found.push(&rest[start..end]);
        rest = &rest[end..];
    }
    found
}

fn parse_entry(entry: &str) -> Option<Paper> {
    let id_url = extract_tag_text(entry, "id")?;
    let title = normalize_whitespace(&extract_tag_text(entry, "title")?);
    if title.is_empty() {
        return None;
    }

    let authors = entry
        .split("<author>")
        .skip(1)
        .filter_map(|block| extract_tag_text(block, "name"))
        .map(|name| normalize_whitespace(&name))
        .collect();

    let abstract_text = normalize_whitespace(&extract_tag_text(entry, "summary").unwrap_or_default());
    let published_date = extract_tag_text(entry, "published")
        .map(|p| p.chars().take(10).collect::<String>())
        .filter(|p| !p.is_empty());

    let categories: Vec<String> = tags(entry, "category ")
        .into_iter()
        .filter_map(|tag| extract_attribute(tag, "term"))
        .collect();

    let url = tags(entry, "link ")
        .into_iter()
        .filter(|tag| extract_attribute(tag, "rel").as_deref() == Some("alternate"))
        .find_map(|tag| extract_attribute(tag, "href"))
        .unwrap_or_else(|| id_url.clone());

    let mut paper = Paper {
        title,
        authors,
        abstract_text,
        published_date,
        url: Some(url),
        categories,
        ..Default::default()
    };
    paper
        .identifiers
        .insert("arxiv".to_string(), strip_version(&extract_arxiv_id_from_url(&id_url)));
    if let Some(doi) = extract_tag_text(entry, "arxiv:doi") {
        paper.identifiers.insert("doi".to_string(), doi);
    }
    Some(paper)
}

/// Text content of the first `<tag>text</tag>`, attributes allowed.
fn extract_tag_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    // Skip longer tag names sharing the prefix, e.g. `<id` vs `<identifier`.
    let mut from = 0;
    let start = loop {
        let pos = from + xml[from..].find(&open)?;
        match xml[pos + open.len()..].chars().next() {
            Some('>') | Some(' ') | Some('\n') | Some('\t') => break pos,
            _ => from = pos + open.len(),
        }
    };
    let content_start = start + xml[start..].find('>')? + 1;
    let content_end = content_start + xml[content_start..].find(&close)?;
    Some(decode_entities(xml[content_start..content_end].trim()))
}

fn extract_attribute(tag: &str, attr: &str) -> Option<String> {
    let search = format!(" {}=\"", attr);
    let start = tag.find(&search)? + search.len();
    let end = start + tag[start..].find('"')?;
    Some(decode_entities(&tag[start..end]))
}

/// Decode the predefined XML entities and numeric character references in
/// one pass, so `&amp;lt;` stays `&lt;`. Unknown or malformed references
/// are kept verbatim.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = match name.strip_prefix('#')? {
                hex if hex.starts_with(['x', 'X']) => u32::from_str_radix(&hex[1..], 16).ok()?,
                dec => dec.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// `http://arxiv.org/abs/1706.03762v7` → `1706.03762v7`
fn extract_arxiv_id_from_url(url: &str) -> String {
    if let Some(pos) = url.rfind("/abs/") {
        url[pos + 5..].to_string()
    } else if let Some(pos) = url.rfind("/pdf/") {
        url[pos + 5..].trim_end_matches(".pdf").to_string()
    } else {
        url.to_string()
    }
}

/// `1706.03762v7` → `1706.03762`; ids without a version are unchanged.
fn strip_version(id: &str) -> String {
    match id.rfind('v') {
        Some(pos)
            if pos > 0
                && pos + 1 < id.len()
                && id[pos + 1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            id[..pos].to_string()
        }
        _ => id.to_string(),
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
