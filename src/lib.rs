// lib.rs - Research digest library: retrieval backends, agents and the workflow graph
pub mod types;
pub mod error;
pub mod config;
pub mod arxiv_client;
pub mod youtube_client;
pub mod openai_client;
pub mod agent;
pub mod workflow;
pub mod report;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::{ConfigError, GenerationError, SourceError, WorkflowError};
pub use types::*;
pub use workflow::research_workflow::{build_research_graph, ResearchWorkflow};
pub use workflow::state::{EventOutcome, EventRecord, ResearchState, StateUpdate};
