// YouTube Data API v3 client for video search
// Docs: https://developers.google.com/youtube/v3/docs/search/list

use crate::agent::video_agent::VideoSource;
use crate::error::SourceError;
use crate::types::{truncate_with_ellipsis, RawVideo};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_YOUTUBE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

// ============================================================================
// Search Response Structures
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchResultItem>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResultItem {
    pub id: SearchResultId,
    pub snippet: SearchResultSnippet,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResultId {
    pub kind: String,
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResultSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "channelTitle")]
    pub channel_title: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
}

impl SearchResultItem {
    /// Channel or playlist hits carry no video id and are dropped
    pub fn into_raw_video(self) -> Option<RawVideo> {
        let video_id = self.id.video_id?;
        Some(RawVideo {
            title: self.snippet.title,
            url: format!("https://www.youtube.com/watch?v={}", video_id),
            description: self.snippet.description,
            published: self.snippet.published_at,
            channel: self.snippet.channel_title,
            duration: None,
            views: None,
        })
    }
}

// ============================================================================
// YouTube Client Implementation
// ============================================================================

impl YouTubeClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, DEFAULT_YOUTUBE_URL, timeout)
    }

    pub fn with_base_url(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search YouTube videos with the API key
    pub async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse, SourceError> {
        let query_params = [
            ("part", "snippet".to_string()),
            ("q", query.to_string()),
            ("type", "video".to_string()),
            ("maxResults", max_results.to_string()),
            ("key", self.api_key.clone()),
        ];

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&query_params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("YouTube search failed ({}): {}", status, body);
            return Err(SourceError::Api {
                backend: "YouTube",
                status: status.as_u16(),
                body: truncate_with_ellipsis(body.trim(), 200),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn search_videos(&self, query: &str, max_results: usize) -> Result<Vec<RawVideo>, SourceError> {
        let response = self.search(query, max_results).await?;
        let videos: Vec<RawVideo> = response
            .items
            .into_iter()
            .filter_map(SearchResultItem::into_raw_video)
            .collect();

        tracing::debug!("📺 YouTube returned {} videos for '{}'", videos.len(), query);
        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "kind": "youtube#searchListResponse",
        "items": [
            {
                "id": {"kind": "youtube#video", "videoId": "abc123"},
                "snippet": {
                    "title": "Transformers lecture",
                    "description": "University course on attention",
                    "channelId": "UC1",
                    "channelTitle": "Stanford Online",
                    "publishedAt": "2025-01-10T10:00:00Z"
                }
            },
            {
                "id": {"kind": "youtube#channel", "channelId": "UC2"},
                "snippet": {"title": "A channel", "description": ""}
            }
        ]
    }"#;

    #[test]
    fn maps_video_hits_and_skips_channels() {
        let response: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let videos: Vec<RawVideo> = response
            .items
            .into_iter()
            .filter_map(SearchResultItem::into_raw_video)
            .collect();

        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(videos[0].channel.as_deref(), Some("Stanford Online"));
        assert_eq!(videos[0].published.as_deref(), Some("2025-01-10T10:00:00Z"));
    }

    #[test]
    fn response_without_items_is_empty() {
        let response: SearchResponse = serde_json::from_str(r#"{"kind": "youtube#searchListResponse"}"#).unwrap();
        assert!(response.items.is_empty());
    }
}
