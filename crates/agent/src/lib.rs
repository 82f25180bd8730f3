//! Dialogue agent for the accommodation assistant
//!
//! Sequences the per-turn pipeline: slot extraction, topic check, the
//! collecting-info questions, the relaxation-cascade search and reply
//! composition. Store trouble never escapes this crate; the only errors
//! callers see are rate limits outside the recoverable search path and
//! transcripts with no user turn.

pub mod composer;
pub mod orchestrator;
pub mod planner;

pub use composer::ResponseComposer;
pub use orchestrator::{ChatAgent, ChatReply, DialogueStage};
pub use planner::QueryPlanner;

use thiserror::Error;

/// Agent-level errors surfaced to the HTTP layer
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Rate limit exceeded at the generative service")]
    RateLimited,

    #[error("Invalid transcript: {0}")]
    InvalidTranscript(String),
}
