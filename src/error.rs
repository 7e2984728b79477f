// error.rs - Error taxonomy for configuration, backends and the workflow engine
use thiserror::Error;

/// Fatal at startup; the run never begins
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingCredential(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("failed to initialise {client} client: {reason}")]
    ClientInit { client: &'static str, reason: String },
    #[error("invalid workflow graph: {0}")]
    Graph(#[from] WorkflowError),
}

/// Failure inside a retrieval backend. Recovered by the owning stage.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{backend} API error ({status}): {body}")]
    Api {
        backend: &'static str,
        status: u16,
        body: String,
    },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Malformed(e.to_string())
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(e: quick_xml::Error) -> Self {
        SourceError::Malformed(format!("XML parse error: {}", e))
    }
}

/// Failure of the text generation backend
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no text content in response")]
    EmptyResponse,
}

/// Errors the workflow engine itself can surface
#[derive(Error, Debug, PartialEq)]
pub enum WorkflowError {
    #[error("graph has no edge from the start node")]
    NoEntryPoint,
    #[error("node '{0}' is declared twice")]
    DuplicateNode(String),
    #[error("edge references unknown node '{0}'")]
    UnknownNode(String),
    #[error("graph contains a cycle through '{0}'")]
    Cycle(String),
    #[error("node '{0}' is unreachable from the start node")]
    Unreachable(String),
    #[error("workflow run was cancelled")]
    Cancelled,
}
