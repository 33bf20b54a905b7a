//! Query resolution stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage of a single query resolution. Stages only move forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStage {
    #[default]
    ReceiveQuery,
    LocalLookup,
    WebLookup,
    Persist,
    Generate,
    Deliver,
}

impl ResolutionStage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReceiveQuery => "receive_query",
            Self::LocalLookup => "local_lookup",
            Self::WebLookup => "web_lookup",
            Self::Persist => "persist",
            Self::Generate => "generate",
            Self::Deliver => "deliver",
        }
    }
}

impl fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks progress and outcomes of one query resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTracker {
    stage: ResolutionStage,
    local_hits: usize,
    web_hits: usize,
    persisted: usize,
    degraded: Vec<ResolutionStage>,
}

impl ResolutionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stage(&self) -> ResolutionStage {
        self.stage
    }

    pub fn transition(&mut self, next: ResolutionStage) {
        debug_assert!(next >= self.stage, "stages only move forward");
        tracing::debug!(from = %self.stage, to = %next, "Stage transition");
        self.stage = next;
    }

    pub fn record_local_hits(&mut self, count: usize) {
        self.local_hits = count;
    }

    pub fn record_web_hits(&mut self, count: usize) {
        self.web_hits = count;
    }

    pub fn record_persisted(&mut self, count: usize) {
        self.persisted = count;
    }

    /// Note that the current stage contributed nothing because it failed.
    pub fn record_degraded(&mut self) {
        if !self.degraded.contains(&self.stage) {
            self.degraded.push(self.stage);
        }
    }

    #[must_use]
    pub fn stats(&self) -> ResolutionStats {
        ResolutionStats {
            local_hits: self.local_hits,
            web_hits: self.web_hits,
            persisted: self.persisted,
            degraded: self.degraded.clone(),
        }
    }
}

/// Outcome summary of one query resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionStats {
    pub local_hits: usize,
    pub web_hits: usize,
    pub persisted: usize,
    pub degraded: Vec<ResolutionStage>,
}
