//! Generative-text service integration
//!
//! The assistant consumes text generation purely as a capability: given a
//! prompt/history, produce a natural-language completion. This crate
//! provides the `LlmBackend` trait and a Gemini REST implementation.

pub mod backend;
pub mod prompt;

pub use backend::{GeminiBackend, GeminiConfig, GenerationResult, LlmBackend};
pub use prompt::{Message, Role};

use thiserror::Error;

/// Generative-service errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Model not available: {0}")]
    ModelNotFound(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for city_living_core::Error {
    fn from(err: LlmError) -> Self {
        city_living_core::Error::Llm(err.to_string())
    }
}
