// ResearchState - Run state with per-field reducers (LangGraph-inspired)
use crate::types::{PaperSummary, VideoSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State reducer strategy for merging a patch field into the current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReducerStrategy {
    /// Replace old value with new value (last write wins)
    Replace,
    /// Concatenate new value onto the old one
    Append,
    /// Keep the first non-empty value, ignore later writes
    KeepFirst,
}

/// A state field that can absorb a patch value under a reducer strategy
pub trait Reducible {
    fn reduce(&mut self, incoming: Self, strategy: ReducerStrategy);
}

impl<T> Reducible for Vec<T> {
    fn reduce(&mut self, incoming: Self, strategy: ReducerStrategy) {
        match strategy {
            ReducerStrategy::Append => self.extend(incoming),
            ReducerStrategy::Replace => *self = incoming,
            ReducerStrategy::KeepFirst => {
                if self.is_empty() {
                    *self = incoming;
                }
            }
        }
    }
}

impl Reducible for String {
    fn reduce(&mut self, incoming: Self, strategy: ReducerStrategy) {
        match strategy {
            ReducerStrategy::Append => self.push_str(&incoming),
            ReducerStrategy::Replace => *self = incoming,
            ReducerStrategy::KeepFirst => {
                if self.is_empty() {
                    *self = incoming;
                }
            }
        }
    }
}

/// Per-field reducer declaration applied by the executor at every join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReducers {
    pub papers: ReducerStrategy,
    pub videos: ReducerStrategy,
    pub document: ReducerStrategy,
    pub events: ReducerStrategy,
}

impl Default for StateReducers {
    fn default() -> Self {
        Self {
            papers: ReducerStrategy::Append,
            videos: ReducerStrategy::Append,
            document: ReducerStrategy::Replace,
            events: ReducerStrategy::Append,
        }
    }
}

/// What a stage reports about its own work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    Success {
        action: String,
        counts: BTreeMap<String, usize>,
    },
    Failure {
        error: String,
    },
}

/// One entry of the run's audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub stage: String,
    pub outcome: EventOutcome,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub fn success(stage: &str, action: &str) -> Self {
        Self {
            stage: stage.to_string(),
            outcome: EventOutcome::Success {
                action: action.to_string(),
                counts: BTreeMap::new(),
            },
            timestamp: Utc::now(),
        }
    }

    pub fn failure(stage: &str, error: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            outcome: EventOutcome::Failure { error: error.into() },
            timestamp: Utc::now(),
        }
    }

    /// Attach a count to a success record. No-op on failures.
    pub fn with_count(mut self, key: &str, value: usize) -> Self {
        if let EventOutcome::Success { counts, .. } = &mut self.outcome {
            counts.insert(key.to_string(), value);
        }
        self
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, EventOutcome::Failure { .. })
    }

    pub fn count(&self, key: &str) -> Option<usize> {
        match &self.outcome {
            EventOutcome::Success { counts, .. } => counts.get(key).copied(),
            EventOutcome::Failure { .. } => None,
        }
    }
}

/// ResearchState - The state object threaded through one workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchState {
    /// Unique run ID, only used to correlate log lines
    pub run_id: String,

    pub domain: String,
    pub recency_window_days: u32,

    pub papers: Vec<PaperSummary>,
    pub videos: Vec<VideoSummary>,

    /// Written by the synthesis stage; empty until then
    pub document: String,

    /// Append-only audit log
    pub events: Vec<EventRecord>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResearchState {
    pub fn new(domain: &str, recency_window_days: u32) -> Self {
        let now = Utc::now();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            domain: domain.to_string(),
            recency_window_days,
            papers: Vec::new(),
            videos: Vec::new(),
            document: String::new(),
            events: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a stage patch using the declared per-field reducers.
    /// Absent patch fields contribute nothing.
    pub fn apply_update(&mut self, update: StateUpdate, reducers: &StateReducers) {
        self.updated_at = Utc::now();

        if let Some(papers) = update.papers {
            self.papers.reduce(papers, reducers.papers);
        }
        if let Some(videos) = update.videos {
            self.videos.reduce(videos, reducers.videos);
        }
        if let Some(document) = update.document {
            self.document.reduce(document, reducers.document);
        }
        if let Some(events) = update.events {
            self.events.reduce(events, reducers.events);
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &EventRecord> {
        self.events.iter().filter(|e| e.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn events_for<'a>(&'a self, stage: &'a str) -> impl Iterator<Item = &'a EventRecord> {
        self.events.iter().filter(move |e| e.stage == stage)
    }
}

/// State update payload (a stage patch)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateUpdate {
    pub papers: Option<Vec<PaperSummary>>,
    pub videos: Option<Vec<VideoSummary>>,
    pub document: Option<String>,
    pub events: Option<Vec<EventRecord>>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_papers(mut self, papers: Vec<PaperSummary>) -> Self {
        self.papers = Some(papers);
        self
    }

    pub fn with_videos(mut self, videos: Vec<VideoSummary>) -> Self {
        self.videos = Some(videos);
        self
    }

    pub fn with_document(mut self, document: String) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_event(mut self, event: EventRecord) -> Self {
        self.events.get_or_insert_with(Vec::new).push(event);
        self
    }

    /// Patch carrying only a failure record for `stage`
    pub fn failed(stage: &str, error: impl Into<String>) -> Self {
        Self::new().with_event(EventRecord::failure(stage, error))
    }
}
