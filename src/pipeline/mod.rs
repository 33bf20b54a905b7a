//! Query resolution.
//!
//! `ReceiveQuery → LocalLookup → (WebLookup) → Persist → Generate → Deliver`,
//! with every stage failure degrading to an empty contribution.

mod orchestrator;
mod state;

pub use orchestrator::{Orchestrator, QueryResult};
pub use state::{ResolutionStage, ResolutionStats, ResolutionTracker};
