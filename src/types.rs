// types.rs - Canonical records exchanged between workflow stages
use serde::{Deserialize, Serialize};

/// Maximum abstract length kept from the academic index.
pub const MAX_SUMMARY_CHARS: usize = 500;

/// Maximum description length kept from the video index.
pub const MAX_DESCRIPTION_CHARS: usize = 300;

/// A recent paper as seen by the rest of the workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    /// Publication date, `YYYY-MM-DD`
    pub published: String,
    pub arxiv_id: String,
    pub url: String,
}

/// A related video as seen by the rest of the workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// Raw video record as returned by a video search backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVideo {
    pub title: String,
    pub url: String,
    pub description: String,
    pub published: Option<String>,
    pub channel: Option<String>,
    pub duration: Option<String>,
    pub views: Option<String>,
}

impl From<RawVideo> for VideoSummary {
    fn from(raw: RawVideo) -> Self {
        Self {
            title: raw.title,
            url: raw.url,
            description: truncate_chars(&raw.description, MAX_DESCRIPTION_CHARS),
            published: non_empty(raw.published),
            channel: non_empty(raw.channel),
        }
    }
}

/// Cut `text` to at most `max` characters without splitting a code point
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Like [`truncate_chars`] but appends `...` when something was cut
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", truncate_chars(text, max))
    } else {
        text.to_string()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
