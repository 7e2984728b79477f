// Workflow orchestration module - LangGraph-inspired state management
pub mod state;
pub mod graph;
pub mod executor;
pub mod research_workflow;
