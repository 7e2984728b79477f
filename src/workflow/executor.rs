// Executor - Runs the workflow graph wave by wave with fan-out and join
use super::graph::{Node, StateGraph};
use super::state::{ResearchState, StateReducers, StateUpdate};
use crate::error::WorkflowError;
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

/// Workflow executor config
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Reducers applied when merging patches at each join
    pub reducers: StateReducers,
    /// Run independent nodes of a wave concurrently
    pub enable_parallel: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            reducers: StateReducers::default(),
            enable_parallel: true,
        }
    }
}

/// Workflow executor
pub struct WorkflowExecutor {
    graph: StateGraph,
    config: ExecutorConfig,
}

impl WorkflowExecutor {
    pub fn new(graph: StateGraph, config: ExecutorConfig) -> Self {
        Self { graph, config }
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    /// Run every node exactly once and return the merged state.
    ///
    /// Stage failures never abort the run; they come back as failure events.
    pub async fn run(&self, mut state: ResearchState) -> ResearchState {
        let span = tracing::info_span!("workflow", run_id = %state.run_id, domain = %state.domain);

        async {
            info!("🚀 Starting workflow: {} waves", self.graph.waves().len());
            let started = Instant::now();

            for (step, wave) in self.graph.waves().iter().enumerate() {
                info!("📍 Wave {}: {:?}", step + 1, wave);

                // Every node in the wave sees the same pre-join snapshot
                let updates = self.execute_wave(wave, &state).await;
                for update in updates {
                    state.apply_update(update, &self.config.reducers);
                }
            }

            info!(
                "🏁 Workflow finished in {:.2}s ({} papers, {} videos, {} events)",
                started.elapsed().as_secs_f64(),
                state.papers.len(),
                state.videos.len(),
                state.events.len()
            );
            state
        }
        .instrument(span)
        .await
    }

    /// Same as [`run`](Self::run) but gives up as soon as `cancel` fires,
    /// dropping any stage calls still in flight.
    pub async fn run_with_cancellation(
        &self,
        state: ResearchState,
        cancel: &CancellationToken,
    ) -> Result<ResearchState, WorkflowError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("⏹️ Workflow cancelled");
                Err(WorkflowError::Cancelled)
            }
            state = self.run(state) => Ok(state),
        }
    }

    /// Execute one wave. Patches come back in declaration order.
    async fn execute_wave(&self, node_ids: &[String], state: &ResearchState) -> Vec<StateUpdate> {
        let nodes: Vec<&Node> = node_ids
            .iter()
            .filter_map(|id| self.graph.get_node(id))
            .collect();

        if self.config.enable_parallel && nodes.len() > 1 {
            info!("⚡ Executing {} nodes concurrently", nodes.len());
            join_all(nodes.into_iter().map(|node| execute_node(node, state))).await
        } else {
            let mut updates = Vec::with_capacity(nodes.len());
            for node in nodes {
                updates.push(execute_node(node, state).await);
            }
            updates
        }
    }
}

/// Execute a node with its timeout, turning every kind of failure into a
/// failure-only patch
async fn execute_node(node: &Node, state: &ResearchState) -> StateUpdate {
    info!("{} Running {:?} node '{}'", node.node_type.icon(), node.node_type, node.id);
    let started = Instant::now();
    let guarded = AssertUnwindSafe(node.function.execute(state)).catch_unwind();

    match timeout(node.timeout, guarded).await {
        Ok(Ok(Ok(update))) => {
            info!(
                "✅ {} Node '{}' completed in {}ms",
                node.node_type.icon(),
                node.id,
                started.elapsed().as_millis()
            );
            update
        }
        Ok(Ok(Err(e))) => {
            warn!("⚠️ Node '{}' failed: {}", node.id, e);
            StateUpdate::failed(&node.id, e)
        }
        Ok(Err(payload)) => {
            let message = panic_message(payload.as_ref());
            error!("❌ Node '{}' panicked: {}", node.id, message);
            StateUpdate::failed(&node.id, format!("stage panicked: {}", message))
        }
        Err(_) => {
            warn!(
                "⏱️ Node '{}' timed out after {}s",
                node.id,
                node.timeout.as_secs()
            );
            StateUpdate::failed(
                &node.id,
                format!("timed out after {}s", node.timeout.as_secs()),
            )
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
