use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{api_error, build_client, ProviderError};
use crate::config::GenerationConfig;

/// Prompt used to check that a candidate model answers at all.
const PROBE_PROMPT: &str = "Reply with the single word: ok";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Free-form text completion.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Model identifier, reported by `/health`.
    fn model_name(&self) -> &str;
}

// ============================================================================
// Gemini API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

// ============================================================================
// GeminiGenerator
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    pub fn new(
        config: &GenerationConfig,
        api_key: &str,
        model: &str,
    ) -> Result<Self, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        Ok(Self {
            client: build_client(config.timeout_seconds)?,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ResponseGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.without_url()))?;

        if !response.status().is_success() {
            let err = api_error(response).await;
            tracing::error!(model = %self.model, error = %err, "Gemini API error");
            return Err(err);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.without_url().to_string()))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        Ok(text.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Probe `candidate_models` in order and keep the first that answers a trivial
/// prompt. If none do, the fallback model is returned without being checked.
///
/// Runs once at startup; request handling never re-selects.
pub async fn select_model(
    config: &GenerationConfig,
    api_key: &str,
) -> Result<GeminiGenerator, ProviderError> {
    for candidate in &config.candidate_models {
        let generator = GeminiGenerator::new(config, api_key, candidate)?;
        match generator.generate(PROBE_PROMPT).await {
            Ok(_) => {
                tracing::info!(model = %candidate, "Generative model selected");
                return Ok(generator);
            }
            Err(e) => {
                tracing::warn!(model = %candidate, error = %e, "Candidate model probe failed");
            }
        }
    }

    tracing::warn!(
        model = %config.fallback_model,
        "No candidate model answered; using fallback model unverified"
    );
    GeminiGenerator::new(config, api_key, &config.fallback_model)
}

// ============================================================================
// TESTS
// ============================================================================
