//! Heuristic language understanding for the accommodation assistant
//!
//! No trained model anywhere: slots are extracted by ordered rule tables
//! (keyword scans and regex patterns) replayed over the full transcript
//! on every request, and topic classification is a keyword check with an
//! explicit "ambiguous" outcome the orchestrator may escalate.

pub mod extractor;
pub mod slots;
pub mod topic;

pub use extractor::IntentExtractor;
pub use slots::SlotSet;
pub use topic::{TopicClassifier, TopicSignal};
