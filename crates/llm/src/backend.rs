//! Generative backend implementations
//!
//! `GeminiBackend` speaks the Gemini REST API. Roles map the way the
//! original web client did: assistant turns become "model", everything
//! else is folded into "user" content.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::prompt::{Message, Role};
use crate::LlmError;

/// Gemini backend configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API endpoint base (up to and including the API version segment)
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// Model name
    pub model: String,
    /// Maximum tokens to generate
    pub max_output_tokens: usize,
    /// Temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: String::new(),
            model: "gemini-1.5-flash-latest".to_string(),
            max_output_tokens: 1000,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Generated text
    pub text: String,
    /// Total generation time (ms)
    pub total_time_ms: u64,
}

/// Generative backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a completion for the given message history
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError>;

    /// Check if the service is reachable
    async fn is_available(&self) -> bool;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Gemini REST backend
pub struct GeminiBackend {
    config: GeminiConfig,
    client: Client,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "API key required for the Gemini service".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Build the generateContent URL for the configured model
    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model,
            self.config.api_key
        )
    }

    /// Map messages to Gemini contents. Gemini only knows "user" and
    /// "model" roles; system instructions ride along as user content.
    fn build_contents(messages: &[Message]) -> Vec<GeminiContent> {
        messages
            .iter()
            .map(|m| GeminiContent {
                role: match m.role {
                    Role::Assistant => "model".to_string(),
                    _ => "user".to_string(),
                },
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect()
    }

    /// Classify a non-success HTTP response into an error variant
    fn classify_status(status: reqwest::StatusCode, body: &str) -> LlmError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || body.to_lowercase().contains("rate limit")
        {
            return LlmError::RateLimited;
        }
        if status == reqwest::StatusCode::NOT_FOUND || body.contains("is not found for API") {
            return LlmError::ModelNotFound(body.to_string());
        }
        if status.is_server_error() {
            return LlmError::Network(format!("Server error {}: {}", status, body));
        }
        LlmError::Api(format!("HTTP {}: {}", status, body))
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = std::time::Instant::now();

        let request = GeminiRequest {
            contents: Self::build_contents(messages),
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &body));
        }

        let response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No candidates in response".to_string()))?;

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(LlmError::InvalidResponse(
                "Candidate contained no text parts".to_string(),
            ));
        }

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            model = %self.config.model,
            chars = text.len(),
            total_time_ms,
            "Generated completion"
        );

        Ok(GenerationResult { text, total_time_ms })
    }

    async fn is_available(&self) -> bool {
        let url = format!(
            "{}/models?key={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.api_key
        );
        self.client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Gemini API types
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_requires_api_key() {
        let config = GeminiConfig::default();
        assert!(GeminiBackend::new(config).is_err());

        let config = GeminiConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        };
        assert!(GeminiBackend::new(config).is_ok());
    }

    #[test]
    fn test_generate_url() {
        let backend = GeminiBackend::new(GeminiConfig {
            api_key: "k".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            backend.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent?key=k"
        );
    }

    #[test]
    fn test_role_mapping() {
        let messages = vec![
            Message::system("Be helpful"),
            Message::user("hi"),
            Message::assistant("hello"),
        ];
        let contents = GeminiBackend::build_contents(&messages);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "user");
        assert_eq!(contents[2].role, "model");
    }

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: GeminiBackend::build_contents(&[Message::user("hello")]),
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                max_output_tokens: 1000,
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("generationConfig"));
        assert!(json.contains("maxOutputTokens"));
        assert!(json.contains("hello"));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            GeminiBackend::classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS, ""),
            LlmError::RateLimited
        ));
        assert!(matches!(
            GeminiBackend::classify_status(reqwest::StatusCode::BAD_REQUEST, "rate limit hit"),
            LlmError::RateLimited
        ));
        assert!(matches!(
            GeminiBackend::classify_status(reqwest::StatusCode::NOT_FOUND, "no such model"),
            LlmError::ModelNotFound(_)
        ));
        assert!(matches!(
            GeminiBackend::classify_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            LlmError::Network(_)
        ));
        assert!(matches!(
            GeminiBackend::classify_status(reqwest::StatusCode::BAD_REQUEST, "bad arg"),
            LlmError::Api(_)
        ));
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "there"}]}}
            ]
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "Hello there");
    }
}
