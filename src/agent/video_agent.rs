// Video retrieval stage - academic videos related to the research domain
use crate::error::SourceError;
use crate::types::{RawVideo, VideoSummary};
use crate::workflow::graph::NodeFunction;
use crate::workflow::state::{EventRecord, ResearchState, StateUpdate};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

pub const VIDEO_STAGE: &str = "video_retrieval";

/// Keywords that mark a video as academic. The first
/// [`EXPANDED_QUERIES`] also drive query expansion.
pub const ACADEMIC_KEYWORDS: [&str; 9] = [
    "research",
    "paper",
    "study",
    "academic",
    "conference",
    "lecture",
    "university",
    "phd",
    "science",
];

pub const EXPANDED_QUERIES: usize = 3;

/// Video search backend
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn search_videos(&self, query: &str, max_results: usize) -> Result<Vec<RawVideo>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct VideoSearchConfig {
    /// Candidates kept after deduplication, split evenly across expanded queries
    pub max_candidates: usize,
    /// Videos kept after filtering
    pub max_results: usize,
    /// Extra filter keywords. `None` means the comma-separated domain terms.
    pub extra_keywords: Option<Vec<String>>,
}

impl Default for VideoSearchConfig {
    fn default() -> Self {
        Self {
            max_candidates: 15,
            max_results: 10,
            extra_keywords: None,
        }
    }
}

pub struct ResearchVideoAgent {
    source: Option<Arc<dyn VideoSource>>,
    config: VideoSearchConfig,
}

impl ResearchVideoAgent {
    pub fn new(source: Option<Arc<dyn VideoSource>>) -> Self {
        Self::with_config(source, VideoSearchConfig::default())
    }

    pub fn with_config(source: Option<Arc<dyn VideoSource>>, config: VideoSearchConfig) -> Self {
        Self { source, config }
    }

    pub async fn retrieve(&self, domain: &str) -> Result<Vec<VideoSummary>, SourceError> {
        let source = self
            .source
            .as_ref()
            .ok_or(SourceError::NotConfigured("YouTube search"))?;

        let queries = expand_queries(domain);
        let per_query = (self.config.max_candidates / queries.len()).max(1);

        let results = join_all(queries.iter().map(|q| source.search_videos(q, per_query))).await;

        let mut candidates = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0;
        for (query, result) in queries.iter().zip(results) {
            match result {
                Ok(videos) => {
                    succeeded += 1;
                    candidates.extend(videos);
                }
                Err(e) => {
                    tracing::warn!("Video query '{}' failed: {}", query, e);
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let mut unique = dedupe_by_url(candidates);
        unique.truncate(self.config.max_candidates);

        let keywords = self.filter_keywords(domain);
        let videos: Vec<VideoSummary> = filter_academic(unique, &keywords)
            .into_iter()
            .take(self.config.max_results)
            .map(VideoSummary::from)
            .collect();

        Ok(videos)
    }

    fn filter_keywords(&self, domain: &str) -> Vec<String> {
        let extra: Vec<String> = match &self.config.extra_keywords {
            Some(words) => words.clone(),
            None => domain.split(',').map(str::to_string).collect(),
        };

        ACADEMIC_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .chain(extra.into_iter().map(|k| k.trim().to_lowercase()))
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// `"<domain> <keyword>"` for the first few academic keywords
pub fn expand_queries(domain: &str) -> Vec<String> {
    ACADEMIC_KEYWORDS
        .iter()
        .take(EXPANDED_QUERIES)
        .map(|keyword| format!("{} {}", domain.trim(), keyword))
        .collect()
}

/// Drop repeated URLs, keeping the first occurrence
pub fn dedupe_by_url(videos: Vec<RawVideo>) -> Vec<RawVideo> {
    let mut seen = HashSet::new();
    videos
        .into_iter()
        .filter(|v| seen.insert(v.url.clone()))
        .collect()
}

/// Keep videos whose title or description mentions any keyword (case-insensitive)
pub fn filter_academic(videos: Vec<RawVideo>, keywords: &[String]) -> Vec<RawVideo> {
    videos
        .into_iter()
        .filter(|v| {
            let title = v.title.to_lowercase();
            let description = v.description.to_lowercase();
            keywords
                .iter()
                .any(|k| title.contains(k.as_str()) || description.contains(k.as_str()))
        })
        .collect()
}

#[async_trait]
impl NodeFunction for ResearchVideoAgent {
    async fn execute(&self, state: &ResearchState) -> Result<StateUpdate, String> {
        tracing::info!("🎥 Retrieving videos for '{}'", state.domain);

        let videos = self
            .retrieve(&state.domain)
            .await
            .map_err(|e| format!("Failed to retrieve videos: {}", e))?;

        if videos.is_empty() {
            tracing::warn!("No academic videos found for '{}'", state.domain);
        }

        let event = EventRecord::success(VIDEO_STAGE, "retrieved_videos").with_count("count", videos.len());
        Ok(StateUpdate::new().with_videos(videos).with_event(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn raw(title: &str, url: &str) -> RawVideo {
        RawVideo {
            title: title.to_string(),
            url: url.to_string(),
            description: String::new(),
            ..Default::default()
        }
    }

    /// Answers each query from a table; unknown queries fail
    struct Scripted {
        answers: HashMap<String, Vec<RawVideo>>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl VideoSource for Scripted {
        async fn search_videos(&self, query: &str, max_results: usize) -> Result<Vec<RawVideo>, SourceError> {
            self.calls.lock().unwrap().push((query.to_string(), max_results));
            self.answers
                .get(query)
                .cloned()
                .ok_or_else(|| SourceError::Malformed(format!("no script for {}", query)))
        }
    }

    #[test]
    fn expands_three_queries() {
        assert_eq!(
            expand_queries("graph theory"),
            vec!["graph theory research", "graph theory paper", "graph theory study"]
        );
    }

    #[test]
    fn dedupe_keeps_first_seen_order() {
        let videos = vec![
            raw("a", "u1"),
            raw("b", "u2"),
            raw("a again", "u1"),
            raw("c", "u3"),
            raw("b again", "u2"),
        ];
        let titles: Vec<_> = dedupe_by_url(videos).into_iter().map(|v| v.title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn filter_matches_title_or_description_case_insensitively() {
        let mut described = raw("Weekend vlog", "u2");
        described.description = "Recorded at a University workshop".to_string();
        let videos = vec![raw("CONFERENCE keynote", "u1"), described, raw("Cooking pasta", "u3")];
        let keywords: Vec<String> = ACADEMIC_KEYWORDS.iter().map(|k| k.to_string()).collect();

        let kept: Vec<_> = filter_academic(videos, &keywords).into_iter().map(|v| v.url).collect();
        assert_eq!(kept, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn merges_queries_dedupes_and_uses_domain_as_keyword() {
        let mut answers = HashMap::new();
        answers.insert(
            "rust research".to_string(),
            vec![raw("Rust ownership explained", "u1"), raw("Cat video", "u2")],
        );
        answers.insert("rust paper".to_string(), vec![raw("Rust ownership explained", "u1")]);
        answers.insert("rust study".to_string(), vec![raw("Study with me", "u3")]);
        let source = Arc::new(Scripted {
            answers,
            calls: Mutex::new(vec![]),
        });
        let agent = ResearchVideoAgent::new(Some(source.clone()));

        let videos = agent.retrieve("rust").await.unwrap();

        let urls: Vec<_> = videos.iter().map(|v| v.url.as_str()).collect();
        assert_eq!(urls, vec!["u1", "u3"]);
        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(_, n)| *n == 5));
    }

    #[tokio::test]
    async fn one_failing_query_is_tolerated() {
        let mut answers = HashMap::new();
        answers.insert("rust research".to_string(), vec![raw("Rust research talk", "u1")]);
        let agent = ResearchVideoAgent::new(Some(Arc::new(Scripted {
            answers,
            calls: Mutex::new(vec![]),
        })));

        let videos = agent.retrieve("rust").await.unwrap();
        assert_eq!(videos.len(), 1);
    }

    #[tokio::test]
    async fn all_queries_failing_is_an_error() {
        let agent = ResearchVideoAgent::new(Some(Arc::new(Scripted {
            answers: HashMap::new(),
            calls: Mutex::new(vec![]),
        })));

        assert!(agent.retrieve("rust").await.is_err());
        let err = agent.execute(&ResearchState::new("rust", 7)).await.unwrap_err();
        assert!(err.starts_with("Failed to retrieve videos"));
    }

    #[tokio::test]
    async fn missing_backend_is_reported() {
        let agent = ResearchVideoAgent::new(None);
        let err = agent.retrieve("rust").await.unwrap_err();
        assert!(matches!(err, SourceError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn caps_filtered_results() {
        let many: Vec<RawVideo> = (0..20).map(|i| raw(&format!("lecture {}", i), &format!("u{}", i))).collect();
        let mut answers = HashMap::new();
        answers.insert("ml research".to_string(), many);
        answers.insert("ml paper".to_string(), vec![]);
        answers.insert("ml study".to_string(), vec![]);
        let agent = ResearchVideoAgent::with_config(
            Some(Arc::new(Scripted {
                answers,
                calls: Mutex::new(vec![]),
            })),
            VideoSearchConfig {
                max_candidates: 12,
                max_results: 4,
                extra_keywords: Some(vec![]),
            },
        );

        let videos = agent.retrieve("ml").await.unwrap();
        assert_eq!(videos.len(), 4);
        assert_eq!(videos[0].url, "u0");
    }
}
