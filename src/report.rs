// report.rs - Console summary and document output for a finished run
use crate::workflow::state::{EventOutcome, ResearchState};
use std::path::{Path, PathBuf};

const SUMMARY_ITEMS: usize = 5;
const SUMMARY_AUTHORS: usize = 2;
const PREVIEW_CHARS: usize = 500;

/// `research_blog_<domain>.md`, spaces replaced by underscores
pub fn output_file_name(domain: &str) -> String {
    format!("research_blog_{}.md", domain.trim().replace(' ', "_"))
}

pub fn output_path(dir: &Path, domain: &str) -> PathBuf {
    dir.join(output_file_name(domain))
}

/// Write the document next to the other outputs. Returns the path written.
pub async fn write_document(dir: &Path, state: &ResearchState) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = output_path(dir, &state.domain);
    tokio::fs::write(&path, state.document.as_bytes()).await?;
    tracing::info!("💾 Document written to {}", path.display());
    Ok(path)
}

/// Human-readable summary of the run
pub fn render_summary(state: &ResearchState) -> String {
    let mut out = String::new();
    let rule = "=".repeat(80);

    out.push_str(&format!("\n{}\n📊 Research summary: {}\n{}\n", rule, state.domain, rule));

    if !state.papers.is_empty() {
        out.push_str(&format!("\n📄 Recent papers ({}):\n", state.papers.len()));
        for (i, paper) in state.papers.iter().take(SUMMARY_ITEMS).enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, paper.title));
            if !paper.authors.is_empty() {
                let mut authors = paper
                    .authors
                    .iter()
                    .take(SUMMARY_AUTHORS)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if paper.authors.len() > SUMMARY_AUTHORS {
                    authors.push_str(" et al.");
                }
                out.push_str(&format!("   Authors: {}\n", authors));
            }
            out.push_str(&format!("   Published: {}\n\n", paper.published));
        }
    }

    if !state.videos.is_empty() {
        out.push_str(&format!("\n🎥 Related videos ({}):\n", state.videos.len()));
        for (i, video) in state.videos.iter().take(SUMMARY_ITEMS).enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, video.title));
            if let Some(channel) = &video.channel {
                out.push_str(&format!("   Channel: {}\n", channel));
            }
            out.push_str(&format!("   Link: {}\n\n", video.url));
        }
    }

    for event in state.failures() {
        if let EventOutcome::Failure { error } = &event.outcome {
            out.push_str(&format!("⚠️  {}: {}\n", event.stage, error));
        }
    }

    if !state.document.is_empty() {
        out.push_str(&format!(
            "\n📏 Document: {} characters\n",
            state.document.chars().count()
        ));
        let dashes = "-".repeat(60);
        out.push_str(&format!("\n📝 Article preview:\n{}\n", dashes));
        out.push_str(&crate::types::truncate_with_ellipsis(&state.document, PREVIEW_CHARS));
        out.push_str(&format!("\n{}\n", dashes));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaperSummary, VideoSummary};
    use crate::workflow::state::EventRecord;

    fn state() -> ResearchState {
        let mut state = ResearchState::new("machine learning", 7);
        state.papers.push(PaperSummary {
            title: "Scaling laws".to_string(),
            authors: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            summary: "s".to_string(),
            published: "2025-01-02".to_string(),
            arxiv_id: "2501.00002v1".to_string(),
            url: "http://arxiv.org/abs/2501.00002v1".to_string(),
        });
        state.videos.push(VideoSummary {
            title: "ML lecture".to_string(),
            url: "https://www.youtube.com/watch?v=x".to_string(),
            description: String::new(),
            published: None,
            channel: Some("MIT".to_string()),
        });
        state.events.push(EventRecord::failure("video_retrieval", "quota exceeded"));
        state.document = "x".repeat(600);
        state
    }

    #[test]
    fn file_name_replaces_spaces() {
        assert_eq!(output_file_name("machine learning"), "research_blog_machine_learning.md");
        assert_eq!(output_file_name("transformers"), "research_blog_transformers.md");
    }

    #[test]
    fn summary_lists_items_failures_and_preview() {
        let summary = render_summary(&state());
        assert!(summary.contains("1. Scaling laws"));
        assert!(summary.contains("Authors: A, B et al."));
        assert!(summary.contains("Channel: MIT"));
        assert!(summary.contains("video_retrieval: quota exceeded"));
        assert!(summary.contains(&format!("{}...", "x".repeat(500))));
        assert!(!summary.contains(&"x".repeat(501)));
    }

    #[test]
    fn summary_reports_document_length_in_characters() {
        let mut state = ResearchState::new("ml", 7);
        state.document = "é".repeat(42);
        assert!(render_summary(&state).contains("Document: 42 characters"));

        state.document.clear();
        assert!(!render_summary(&state).contains("Document:"));
    }

    #[tokio::test]
    async fn writes_document_to_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = state();

        let path = write_document(dir.path(), &state).await.unwrap();

        assert_eq!(path, dir.path().join("research_blog_machine_learning.md"));
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, state.document);
    }
}
