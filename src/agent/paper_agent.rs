// Paper retrieval stage - recent papers for the research domain
use crate::error::SourceError;
use crate::types::PaperSummary;
use crate::workflow::graph::NodeFunction;
use crate::workflow::state::{EventRecord, ResearchState, StateUpdate};
use async_trait::async_trait;
use std::sync::Arc;

pub const PAPER_STAGE: &str = "paper_retrieval";
pub const MAX_PAPERS: usize = 10;

/// Academic search backend
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Newest papers for `domain` published within the last `days` days
    async fn search_recent_papers(
        &self,
        domain: &str,
        max_results: usize,
        days: u32,
    ) -> Result<Vec<PaperSummary>, SourceError>;
}

pub struct PaperRetrievalAgent {
    source: Arc<dyn PaperSource>,
    max_results: usize,
}

impl PaperRetrievalAgent {
    pub fn new(source: Arc<dyn PaperSource>) -> Self {
        Self {
            source,
            max_results: MAX_PAPERS,
        }
    }

    pub async fn retrieve(&self, domain: &str, days: u32) -> Result<Vec<PaperSummary>, SourceError> {
        let mut papers = self
            .source
            .search_recent_papers(domain, self.max_results, days)
            .await?;
        papers.truncate(self.max_results);
        Ok(papers)
    }
}

#[async_trait]
impl NodeFunction for PaperRetrievalAgent {
    async fn execute(&self, state: &ResearchState) -> Result<StateUpdate, String> {
        tracing::info!(
            "📄 Retrieving papers for '{}' (last {} days)",
            state.domain,
            state.recency_window_days
        );

        let papers = self
            .retrieve(&state.domain, state.recency_window_days)
            .await
            .map_err(|e| format!("Failed to retrieve papers: {}", e))?;

        if papers.is_empty() {
            tracing::warn!("No papers found for '{}'", state.domain);
        }

        let event = EventRecord::success(PAPER_STAGE, "retrieved_papers").with_count("count", papers.len());
        Ok(StateUpdate::new().with_papers(papers).with_event(event))
    }
}
