// Research workflow - paper and video retrieval fan out, synthesis joins them
//
//            ┌─► paper_retrieval ─┐
//  __start__ ┤                    ├─► content_synthesis ─► __end__
//            └─► video_retrieval ─┘

use super::executor::{ExecutorConfig, WorkflowExecutor};
use super::graph::{NodeType, StateGraph, StateGraphBuilder, END, START};
use super::state::ResearchState;
use crate::agent::paper_agent::{PaperRetrievalAgent, PaperSource, PAPER_STAGE};
use crate::agent::synthesis_agent::{ContentSynthesisAgent, TextGenerator, SYNTHESIS_STAGE};
use crate::agent::video_agent::{ResearchVideoAgent, VideoSource, VIDEO_STAGE};
use crate::arxiv_client::ArxivClient;
use crate::config::Config;
use crate::error::{ConfigError, WorkflowError};
use crate::openai_client::OpenAiClient;
use crate::youtube_client::YouTubeClient;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Build the research graph around the given backends
pub fn build_research_graph(
    papers: Arc<dyn PaperSource>,
    videos: Option<Arc<dyn VideoSource>>,
    generator: Arc<dyn TextGenerator>,
    stage_timeout: Duration,
) -> Result<StateGraph, WorkflowError> {
    StateGraphBuilder::new()
        .node_timeout(stage_timeout)
        .add_node(
            PAPER_STAGE,
            NodeType::Retrieval,
            Arc::new(PaperRetrievalAgent::new(papers)),
            "Recent papers from the academic index",
        )
        .add_node(
            VIDEO_STAGE,
            NodeType::Retrieval,
            Arc::new(ResearchVideoAgent::new(videos)),
            "Academic videos from the video index",
        )
        .add_node(
            SYNTHESIS_STAGE,
            NodeType::Synthesis,
            Arc::new(ContentSynthesisAgent::new(generator)),
            "Long-form article from papers and videos",
        )
        .add_parallel_edges(START, &[PAPER_STAGE, VIDEO_STAGE])
        .add_join(&[PAPER_STAGE, VIDEO_STAGE], SYNTHESIS_STAGE)
        .add_edge(SYNTHESIS_STAGE, END)
        .build()
}

pub struct ResearchWorkflow {
    executor: WorkflowExecutor,
}

impl ResearchWorkflow {
    pub fn new(
        papers: Arc<dyn PaperSource>,
        videos: Option<Arc<dyn VideoSource>>,
        generator: Arc<dyn TextGenerator>,
        stage_timeout: Duration,
    ) -> Result<Self, WorkflowError> {
        let graph = build_research_graph(papers, videos, generator, stage_timeout)?;
        Ok(Self {
            executor: WorkflowExecutor::new(graph, ExecutorConfig::default()),
        })
    }

    /// Wire the real arXiv, YouTube and chat completion backends
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let arxiv = ArxivClient::new(&config.arxiv_api_url, config.stage_timeout).map_err(|e| {
            ConfigError::ClientInit {
                client: "arXiv",
                reason: e.to_string(),
            }
        })?;

        let youtube: Option<Arc<dyn VideoSource>> = match &config.youtube_api_key {
            Some(key) => {
                let client: Arc<dyn VideoSource> = Arc::new(
                    YouTubeClient::new(key.clone(), config.stage_timeout).map_err(|e| {
                        ConfigError::ClientInit {
                            client: "YouTube",
                            reason: e.to_string(),
                        }
                    })?,
                );
                Some(client)
            }
            None => {
                tracing::warn!("YOUTUBE_API_KEY not found. Video retrieval will be skipped.");
                None
            }
        };

        let generator = OpenAiClient::new(config.openai_api_key.clone())
            .with_base_url(&config.openai_base_url)
            .with_model(&config.openai_model)
            .with_temperature(config.openai_temperature)
            .with_timeout(config.stage_timeout);

        Ok(Self::new(
            Arc::new(arxiv),
            youtube,
            Arc::new(generator),
            config.stage_timeout,
        )?)
    }

    pub fn graph(&self) -> &StateGraph {
        self.executor.graph()
    }

    /// Run the workflow for `domain`, keeping papers from the last `recency_window_days` days
    pub async fn run(&self, domain: &str, recency_window_days: u32) -> ResearchState {
        self.run_with_state(ResearchState::new(domain, recency_window_days)).await
    }

    /// Run the graph on top of an existing state; list fields accumulate
    pub async fn run_with_state(&self, state: ResearchState) -> ResearchState {
        self.executor.run(state).await
    }

    pub async fn run_with_cancellation(
        &self,
        domain: &str,
        recency_window_days: u32,
        cancel: &CancellationToken,
    ) -> Result<ResearchState, WorkflowError> {
        self.executor
            .run_with_cancellation(ResearchState::new(domain, recency_window_days), cancel)
            .await
    }
}
