// Content synthesis stage - turns papers and videos into one long-form article
use crate::error::GenerationError;
use crate::types::{truncate_with_ellipsis, PaperSummary, VideoSummary};
use crate::workflow::graph::NodeFunction;
use crate::workflow::state::{EventRecord, ResearchState, StateUpdate};
use async_trait::async_trait;
use std::sync::Arc;

pub const SYNTHESIS_STAGE: &str = "content_synthesis";

pub const MAX_FORMATTED_PAPERS: usize = 8;
pub const MAX_FORMATTED_VIDEOS: usize = 6;
pub const MAX_LISTED_AUTHORS: usize = 3;
pub const VIDEO_DESCRIPTION_CHARS: usize = 150;

pub const NO_PAPERS_PLACEHOLDER: &str = "No recent papers available.";
pub const NO_VIDEOS_PLACEHOLDER: &str = "No related videos available.";
pub const ET_AL: &str = "et al.";

/// Text generation backend; one blocking request per call
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError>;
}

pub struct ContentSynthesisAgent {
    generator: Arc<dyn TextGenerator>,
}

impl ContentSynthesisAgent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn synthesize(
        &self,
        domain: &str,
        papers: &[PaperSummary],
        videos: &[VideoSummary],
    ) -> Result<String, GenerationError> {
        let prompt = build_prompt(domain, &format_papers(papers), &format_videos(videos));
        tracing::debug!("Synthesis prompt: {} chars", prompt.len());
        self.generator.generate_text(&prompt).await
    }
}

#[async_trait]
impl NodeFunction for ContentSynthesisAgent {
    async fn execute(&self, state: &ResearchState) -> Result<StateUpdate, String> {
        tracing::info!(
            "📝 Writing article for '{}' from {} papers and {} videos",
            state.domain,
            state.papers.len(),
            state.videos.len()
        );

        let document = self
            .synthesize(&state.domain, &state.papers, &state.videos)
            .await
            .map_err(|e| format!("Failed to generate document: {}", e))?;

        let event = EventRecord::success(SYNTHESIS_STAGE, "generated_document")
            .with_count("papers_count", state.papers.len())
            .with_count("videos_count", state.videos.len());
        Ok(StateUpdate::new().with_document(document).with_event(event))
    }
}

/// Up to three names, then an `et al.` marker
pub fn format_authors(authors: &[String]) -> String {
    let listed = authors
        .iter()
        .take(MAX_LISTED_AUTHORS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    if authors.len() > MAX_LISTED_AUTHORS {
        format!("{} {}", listed, ET_AL)
    } else {
        listed
    }
}

pub fn format_papers(papers: &[PaperSummary]) -> String {
    if papers.is_empty() {
        return NO_PAPERS_PLACEHOLDER.to_string();
    }

    papers
        .iter()
        .take(MAX_FORMATTED_PAPERS)
        .enumerate()
        .map(|(i, paper)| {
            format!(
                "{}. **{}**\n   - Authors: {}\n   - Published: {}\n   - Abstract: {}\n   - arXiv ID: {}\n",
                i + 1,
                paper.title,
                format_authors(&paper.authors),
                paper.published,
                paper.summary,
                paper.arxiv_id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_videos(videos: &[VideoSummary]) -> String {
    if videos.is_empty() {
        return NO_VIDEOS_PLACEHOLDER.to_string();
    }

    videos
        .iter()
        .take(MAX_FORMATTED_VIDEOS)
        .enumerate()
        .map(|(i, video)| {
            format!(
                "{}. **{}**\n   - Link: {}\n   - Channel: {}\n   - Description: {}\n",
                i + 1,
                video.title,
                video.url,
                video.channel.as_deref().unwrap_or("Unknown"),
                truncate_with_ellipsis(&video.description, VIDEO_DESCRIPTION_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(domain: &str, papers_block: &str, videos_block: &str) -> String {
    format!(
        r#"You are a professional science blogger. Using the latest papers and video resources below, write an engaging blog post about the field of "{domain}".

Latest papers:
{papers_block}

Related videos:
{videos_block}

Write a complete article with the following sections:

1. **Introduction**: an overview of where the field currently stands
2. **Recent Progress**: key findings and innovations drawn from the papers
3. **Deep Dive**: a detailed analysis of one or two important papers
4. **Recommended Videos**: videos worth watching for learning and research
5. **Outlook**: where current research trends are heading
6. **Conclusion**: the main takeaways and recommendations

Requirements:
- Professional but accessible language
- Accurate and objective content
- Cite paper titles and authors where relevant
- Include video links with a short explanation
- Between 1500 and 2000 words
- Markdown formatting

Begin the article:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn paper(i: usize, authors: usize) -> PaperSummary {
        PaperSummary {
            title: format!("Paper {}", i),
            authors: (0..authors).map(|a| format!("Author {}", a)).collect(),
            summary: "abstract".to_string(),
            published: "2025-01-01".to_string(),
            arxiv_id: format!("2501.{:05}v1", i),
            url: format!("http://arxiv.org/abs/2501.{:05}v1", i),
        }
    }

    fn video(i: usize, description: &str) -> VideoSummary {
        VideoSummary {
            title: format!("Video {}", i),
            url: format!("https://www.youtube.com/watch?v={}", i),
            description: description.to_string(),
            published: None,
            channel: None,
        }
    }

    struct Recorder(Mutex<Option<String>>);

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
            *self.0.lock().unwrap() = Some(prompt.to_string());
            Ok("# Article".to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl TextGenerator for Broken {
        async fn generate_text(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::EmptyResponse)
        }
    }

    #[test]
    fn paper_block_is_capped_at_eight() {
        let papers: Vec<_> = (1..=12).map(|i| paper(i, 1)).collect();
        let block = format_papers(&papers);
        assert_eq!(block.matches("**Paper ").count(), MAX_FORMATTED_PAPERS);
        assert!(block.contains("8. **Paper 8**"));
        assert!(!block.contains("Paper 9"));
    }

    #[test]
    fn long_author_lists_are_shortened() {
        let authors: Vec<String> = (0..5).map(|a| format!("Author {}", a)).collect();
        assert_eq!(format_authors(&authors), "Author 0, Author 1, Author 2 et al.");
        assert_eq!(format_authors(&authors[..3]), "Author 0, Author 1, Author 2");
    }

    #[test]
    fn video_block_caps_entries_and_descriptions() {
        let long = "d".repeat(400);
        let videos: Vec<_> = (1..=9).map(|i| video(i, &long)).collect();
        let block = format_videos(&videos);
        assert_eq!(block.matches("**Video ").count(), MAX_FORMATTED_VIDEOS);
        assert!(block.contains(&format!("{}...", "d".repeat(VIDEO_DESCRIPTION_CHARS))));
        assert!(!block.contains(&"d".repeat(VIDEO_DESCRIPTION_CHARS + 1)));
        assert!(block.contains("Channel: Unknown"));
    }

    #[test]
    fn empty_inputs_use_placeholders() {
        assert_eq!(format_papers(&[]), NO_PAPERS_PLACEHOLDER);
        assert_eq!(format_videos(&[]), NO_VIDEOS_PLACEHOLDER);
    }

    #[tokio::test]
    async fn prompt_carries_domain_and_both_blocks() {
        let recorder = Arc::new(Recorder(Mutex::new(None)));
        let agent = ContentSynthesisAgent::new(recorder.clone());
        let mut state = ResearchState::new("transformers", 7);
        state.papers.push(paper(1, 5));

        let update = agent.execute(&state).await.unwrap();

        assert_eq!(update.document.as_deref(), Some("# Article"));
        let prompt = recorder.0.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("\"transformers\""));
        assert!(prompt.contains("Author 0, Author 1, Author 2 et al."));
        assert!(prompt.contains(NO_VIDEOS_PLACEHOLDER));
        let event = &update.events.unwrap()[0];
        assert_eq!(event.count("papers_count"), Some(1));
        assert_eq!(event.count("videos_count"), Some(0));
    }

    #[tokio::test]
    async fn generation_failure_is_reported_without_document() {
        let agent = ContentSynthesisAgent::new(Arc::new(Broken));
        let err = agent.execute(&ResearchState::new("transformers", 7)).await.unwrap_err();
        assert!(err.contains("no text content"));
    }
}
