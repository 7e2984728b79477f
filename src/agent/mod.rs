// src/agent/mod.rs
pub mod paper_agent;
pub mod video_agent;
pub mod synthesis_agent;

pub use paper_agent::{PaperRetrievalAgent, PaperSource};
pub use synthesis_agent::{ContentSynthesisAgent, TextGenerator};
pub use video_agent::{ResearchVideoAgent, VideoSource};
