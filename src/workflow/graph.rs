// StateGraph - Node and edge declaration (LangGraph-inspired)
use super::state::{ResearchState, StateUpdate};
use crate::error::WorkflowError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Implicit entry node
pub const START: &str = "__start__";
/// Implicit terminal node
pub const END: &str = "__end__";

const DEFAULT_NODE_TIMEOUT: Duration = Duration::from_secs(120);

/// Node function type - async function that reads a state snapshot and returns a patch
#[async_trait]
pub trait NodeFunction: Send + Sync {
    async fn execute(&self, state: &ResearchState) -> Result<StateUpdate, String>;
}

/// Node types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Pulls data from an external source
    Retrieval,
    /// Combines upstream results through a generation call
    Synthesis,
}

impl NodeType {
    /// Prefix for the node's progress log lines
    pub fn icon(self) -> &'static str {
        match self {
            NodeType::Retrieval => "📥",
            NodeType::Synthesis => "🧠",
        }
    }
}

/// Graph node
pub struct Node {
    pub id: String,
    pub node_type: NodeType,
    pub function: Arc<dyn NodeFunction>,
    pub description: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("node_type", &self.node_type)
            .field("description", &self.description)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// StateGraph - A compiled, acyclic workflow graph.
///
/// Only obtainable through [`StateGraphBuilder::build`], so every instance has
/// passed validation and carries its execution waves.
#[derive(Debug)]
pub struct StateGraph {
    /// Nodes in declaration order
    nodes: Vec<Node>,
    index: HashMap<String, usize>,

    /// node_id -> ids of nodes it waits for (START excluded)
    predecessors: HashMap<String, Vec<String>>,

    /// Groups of nodes that become ready together
    waves: Vec<Vec<String>>,

    edge_count: usize,
}

impl StateGraph {
    fn compile(nodes: Vec<Node>, edges: Vec<(String, String)>) -> Result<Self, WorkflowError> {
        let mut index = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            if node.id == START || node.id == END || index.insert(node.id.clone(), i).is_some() {
                return Err(WorkflowError::DuplicateNode(node.id.clone()));
            }
        }

        let mut predecessors: HashMap<String, Vec<String>> =
            nodes.iter().map(|n| (n.id.clone(), Vec::new())).collect();
        let mut from_start: HashSet<String> = HashSet::new();

        for (from, to) in &edges {
            if from != START && !index.contains_key(from) {
                return Err(WorkflowError::UnknownNode(from.clone()));
            }
            if to != END && !index.contains_key(to) {
                return Err(WorkflowError::UnknownNode(to.clone()));
            }
            if to == END {
                continue;
            }
            if from == START {
                from_start.insert(to.clone());
            } else if let Some(preds) = predecessors.get_mut(to) {
                if !preds.contains(from) {
                    preds.push(from.clone());
                }
            }
        }

        if from_start.is_empty() {
            return Err(WorkflowError::NoEntryPoint);
        }

        // A node with no incoming edge at all can never run
        for node in &nodes {
            if predecessors[&node.id].is_empty() && !from_start.contains(&node.id) {
                return Err(WorkflowError::Unreachable(node.id.clone()));
            }
        }

        let waves = Self::layer(&nodes, &predecessors)?;

        tracing::info!(
            "✅ StateGraph compiled: {} nodes, {} edges, {} waves",
            nodes.len(),
            edges.len(),
            waves.len()
        );

        Ok(Self {
            nodes,
            index,
            predecessors,
            waves,
            edge_count: edges.len(),
        })
    }

    /// Kahn-style layering; anything left over sits on a cycle
    fn layer(
        nodes: &[Node],
        predecessors: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<Vec<String>>, WorkflowError> {
        let mut done: HashSet<&str> = HashSet::new();
        let mut waves = Vec::new();

        while done.len() < nodes.len() {
            let ready: Vec<String> = nodes
                .iter()
                .filter(|n| !done.contains(n.id.as_str()))
                .filter(|n| predecessors[&n.id].iter().all(|p| done.contains(p.as_str())))
                .map(|n| n.id.clone())
                .collect();

            if ready.is_empty() {
                let stuck = nodes
                    .iter()
                    .find(|n| !done.contains(n.id.as_str()))
                    .map(|n| n.id.clone())
                    .unwrap_or_default();
                return Err(WorkflowError::Cycle(stuck));
            }

            for id in &ready {
                if let Some(node) = nodes.iter().find(|n| &n.id == id) {
                    done.insert(node.id.as_str());
                }
            }
            waves.push(ready);
        }

        Ok(waves)
    }

    /// Get node by ID
    pub fn get_node(&self, node_id: &str) -> Option<&Node> {
        self.index.get(node_id).map(|&i| &self.nodes[i])
    }

    /// Nodes a given node waits for
    pub fn predecessors(&self, node_id: &str) -> &[String] {
        self.predecessors
            .get(node_id)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    /// Execution waves in order; nodes inside a wave are independent
    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    /// All node IDs in declaration order
    pub fn get_node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

/// Builder pattern for StateGraph
pub struct StateGraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<(String, String)>,
    default_timeout: Duration,
}

impl StateGraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            default_timeout: DEFAULT_NODE_TIMEOUT,
        }
    }

    /// Timeout applied to nodes added after this call
    pub fn node_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn add_node(
        mut self,
        id: &str,
        node_type: NodeType,
        function: Arc<dyn NodeFunction>,
        description: &str,
    ) -> Self {
        self.nodes.push(Node {
            id: id.to_string(),
            node_type,
            function,
            description: description.to_string(),
            timeout: self.default_timeout,
        });
        self
    }

    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.edges.push((from.to_string(), to.to_string()));
        self
    }

    /// Fan-out: one source, several targets
    pub fn add_parallel_edges(mut self, from: &str, targets: &[&str]) -> Self {
        for target in targets {
            self.edges.push((from.to_string(), target.to_string()));
        }
        self
    }

    /// Fan-in: several sources joined into one target
    pub fn add_join(mut self, sources: &[&str], to: &str) -> Self {
        for source in sources {
            self.edges.push((source.to_string(), to.to_string()));
        }
        self
    }

    pub fn build(self) -> Result<StateGraph, WorkflowError> {
        StateGraph::compile(self.nodes, self.edges)
    }
}

impl Default for StateGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
