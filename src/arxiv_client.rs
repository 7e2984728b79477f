// arXiv Atom API client for recent paper search
// Docs: https://info.arxiv.org/help/api/user-manual.html

use crate::agent::paper_agent::PaperSource;
use crate::error::SourceError;
use crate::types::{truncate_with_ellipsis, PaperSummary, MAX_SUMMARY_CHARS};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_ARXIV_URL: &str = "https://export.arxiv.org/api/query";

#[derive(Debug, Clone)]
pub struct ArxivClient {
    client: Client,
    base_url: String,
}

/// One `<entry>` of the Atom feed, before any filtering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomEntry {
    pub id: String,
    pub title: String,
    pub published: String,
    pub summary: String,
    pub authors: Vec<String>,
}

impl ArxivClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(concat!("research_digest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// `all:` search; multi-word domains require every word
    fn build_query(domain: &str) -> String {
        let terms: Vec<String> = domain
            .split_whitespace()
            .map(|t| format!("all:{}", t))
            .collect();
        if terms.is_empty() {
            "all:*".to_string()
        } else {
            terms.join(" AND ")
        }
    }

    /// Fetch the newest submissions for `domain`, newest first
    pub async fn fetch_feed(&self, domain: &str, max_results: usize) -> Result<Vec<AtomEntry>, SourceError> {
        let search_query = Self::build_query(domain);
        tracing::debug!("arXiv query: {} (max {})", search_query, max_results);

        let max_results = max_results.to_string();
        self.get_feed(&[
            ("search_query", search_query.as_str()),
            ("start", "0"),
            ("max_results", max_results.as_str()),
            ("sortBy", "submittedDate"),
            ("sortOrder", "descending"),
        ])
        .await
    }

    /// Look up a single paper by arXiv id (`2501.01234` or `2501.01234v2`)
    pub async fn fetch_by_id(&self, arxiv_id: &str) -> Result<PaperSummary, SourceError> {
        let arxiv_id = arxiv_id.trim();
        tracing::debug!("arXiv lookup: {}", arxiv_id);

        let entries = self.get_feed(&[("id_list", arxiv_id), ("max_results", "1")]).await?;
        paper_from_lookup(entries, arxiv_id)
    }

    async fn get_feed(&self, params: &[(&str, &str)]) -> Result<Vec<AtomEntry>, SourceError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .header(ACCEPT, "application/atom+xml, application/xml;q=0.9, text/xml;q=0.8")
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                backend: "arXiv",
                status: status.as_u16(),
                body: truncate_with_ellipsis(body.trim(), 200),
            });
        }

        if !(content_type.contains("xml") || content_type.contains("atom")) {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Malformed(format!(
                "unexpected content-type {}: {}",
                content_type,
                truncate_with_ellipsis(body.trim(), 200)
            )));
        }

        let text = response.text().await?;
        parse_atom_feed(&text)
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn search_recent_papers(
        &self,
        domain: &str,
        max_results: usize,
        days: u32,
    ) -> Result<Vec<PaperSummary>, SourceError> {
        let entries = self.fetch_feed(domain, max_results).await?;
        let fetched = entries.len();
        let papers = select_recent(entries, Utc::now(), days, max_results);

        tracing::info!(
            "📄 arXiv returned {} entries for '{}', {} within {} days",
            fetched,
            domain,
            papers.len(),
            days
        );
        Ok(papers)
    }
}

/// Keep entries published inside the recency window and convert them
pub fn select_recent(
    entries: Vec<AtomEntry>,
    now: DateTime<Utc>,
    days: u32,
    max_results: usize,
) -> Vec<PaperSummary> {
    let cutoff = now - ChronoDuration::days(i64::from(days));

    entries
        .into_iter()
        .filter_map(|entry| {
            let published = match parse_published(&entry) {
                Ok(ts) => ts,
                Err(e) => {
                    tracing::warn!("Skipping arXiv entry {}: {}", entry.id, e);
                    return None;
                }
            };
            (published >= cutoff).then(|| to_summary(entry, published))
        })
        .take(max_results)
        .collect()
}

/// First entry of an `id_list` lookup. arXiv answers unknown ids with an
/// empty feed or an entry under its `/api/errors` id.
pub fn paper_from_lookup(entries: Vec<AtomEntry>, arxiv_id: &str) -> Result<PaperSummary, SourceError> {
    let entry = entries
        .into_iter()
        .find(|e| !e.id.contains("/api/errors"))
        .ok_or_else(|| SourceError::NotFound(format!("arXiv paper {}", arxiv_id)))?;
    let published = parse_published(&entry)?;
    Ok(to_summary(entry, published))
}

fn parse_published(entry: &AtomEntry) -> Result<DateTime<Utc>, SourceError> {
    DateTime::parse_from_rfc3339(&entry.published)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| SourceError::Malformed(format!("bad published date '{}': {}", entry.published, e)))
}

fn to_summary(entry: AtomEntry, published: DateTime<Utc>) -> PaperSummary {
    PaperSummary {
        title: collapse_whitespace(&entry.title),
        summary: truncate_with_ellipsis(&collapse_whitespace(&entry.summary), MAX_SUMMARY_CHARS),
        published: published.format("%Y-%m-%d").to_string(),
        arxiv_id: entry.id.rsplit('/').next().unwrap_or(&entry.id).to_string(),
        authors: entry.authors,
        url: entry.id,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn local_name(raw: &[u8]) -> &[u8] {
    match raw.iter().position(|b| *b == b':') {
        Some(ix) => &raw[ix + 1..],
        None => raw,
    }
}

/// Parse the Atom document returned by the arXiv query API
pub fn parse_atom_feed(xml: &str) -> Result<Vec<AtomEntry>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut out = Vec::new();

    let mut saw_feed = false;
    let mut current: Option<AtomEntry> = None;
    let mut text_target: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name_buf = e.name().as_ref().to_vec();
                match local_name(&name_buf) {
                    b"feed" => saw_feed = true,
                    b"entry" => {
                        current = Some(AtomEntry::default());
                        text_target = None;
                    }
                    b"id" if current.is_some() => text_target = Some("id"),
                    b"title" if current.is_some() => text_target = Some("title"),
                    b"published" if current.is_some() => text_target = Some("published"),
                    b"summary" if current.is_some() => text_target = Some("summary"),
                    b"name" if current.is_some() => text_target = Some("author"),
                    _ => {}
                }
            }
            Event::Text(t) => {
                if let (Some(tag), Some(entry)) = (text_target.take(), current.as_mut()) {
                    let txt = t.unescape()?.to_string();
                    match tag {
                        "id" => entry.id = txt,
                        "title" => entry.title = txt,
                        "published" => entry.published = txt,
                        "summary" => entry.summary = txt,
                        "author" => entry.authors.push(txt),
                        _ => {}
                    }
                }
            }
            Event::End(e) => {
                let name_buf = e.name().as_ref().to_vec();
                if local_name(&name_buf) == b"entry" {
                    if let Some(entry) = current.take() {
                        if entry.id.is_empty() || entry.title.is_empty() {
                            return Err(SourceError::Malformed("arXiv entry without id or title".to_string()));
                        }
                        out.push(entry);
                    }
                }
                text_target = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_feed {
        return Err(SourceError::Malformed("response is not an Atom feed".to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>http://arxiv.org/api/query</id>
  <title>ArXiv Query</title>
  <entry>
    <id>http://arxiv.org/abs/2501.01234v2</id>
    <updated>2025-01-16T12:00:00Z</updated>
    <published>2025-01-15T12:00:00Z</published>
    <title>Sparse Mixture-of-Experts
      Routing</title>
    <summary>We study routing &amp; load balancing.</summary>
    <author><name>Doe, J.</name></author>
    <author><name>Smith, A.</name></author>
    <link rel="alternate" type="text/html" href="https://arxiv.org/abs/2501.01234v2"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2412.09999v1</id>
    <published>2024-12-01T08:00:00Z</published>
    <title>An older paper</title>
    <summary>Old news.</summary>
    <author><name>Roe, R.</name></author>
  </entry>
</feed>
"#;

    #[test]
    fn parses_entries_and_ignores_feed_metadata() {
        let entries = parse_atom_feed(SAMPLE).expect("parse");
        assert_eq!(entries.len(), 2);
        let first = &entries[0];
        assert_eq!(first.id, "http://arxiv.org/abs/2501.01234v2");
        assert_eq!(first.published, "2025-01-15T12:00:00Z");
        assert_eq!(first.summary, "We study routing & load balancing.");
        assert_eq!(first.authors, vec!["Doe, J.", "Smith, A."]);
    }

    #[test]
    fn recency_window_filters_and_converts() {
        let entries = parse_atom_feed(SAMPLE).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();

        let papers = select_recent(entries, now, 7, 10);

        assert_eq!(papers.len(), 1);
        let paper = &papers[0];
        assert_eq!(paper.title, "Sparse Mixture-of-Experts Routing");
        assert_eq!(paper.published, "2025-01-15");
        assert_eq!(paper.arxiv_id, "2501.01234v2");
        assert_eq!(paper.url, "http://arxiv.org/abs/2501.01234v2");
    }

    #[test]
    fn long_abstracts_are_truncated() {
        let entry = AtomEntry {
            id: "http://arxiv.org/abs/2501.00001v1".to_string(),
            title: "t".to_string(),
            published: "2025-01-19T00:00:00Z".to_string(),
            summary: "word ".repeat(200),
            authors: vec![],
        };
        let now = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        let papers = select_recent(vec![entry], now, 7, 10);
        assert!(papers[0].summary.ends_with("..."));
        assert_eq!(papers[0].summary.chars().count(), MAX_SUMMARY_CHARS + 3);
    }

    #[test]
    fn empty_feed_is_not_an_error() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>ArXiv Query</title></feed>"#;
        assert!(parse_atom_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn html_error_page_is_malformed() {
        let err = parse_atom_feed("<html><body>Service unavailable</body></html>").unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn lookup_returns_the_requested_paper() {
        let entries = parse_atom_feed(SAMPLE).unwrap();
        let paper = paper_from_lookup(entries, "2501.01234v2").unwrap();
        assert_eq!(paper.arxiv_id, "2501.01234v2");
        assert_eq!(paper.title, "Sparse Mixture-of-Experts Routing");
        assert_eq!(paper.authors, vec!["Doe, J.", "Smith, A."]);
    }

    #[test]
    fn lookup_of_unknown_id_is_not_found() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_nope</id>
    <title>Error</title>
    <summary>incorrect id format for nope</summary>
  </entry>
</feed>"#;
        let err = paper_from_lookup(parse_atom_feed(xml).unwrap(), "nope").unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));

        let err = paper_from_lookup(Vec::new(), "2501.99999").unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn multi_word_domains_are_anded() {
        assert_eq!(ArxivClient::build_query("graph neural"), "all:graph AND all:neural");
        assert_eq!(ArxivClient::build_query("  "), "all:*");
    }
}
