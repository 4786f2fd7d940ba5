use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{api_error, build_client, ProviderError};
use crate::config::SentimentConfig;

/// Coarse emotional label for a piece of text.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Returns a lowercase label such as `positive` or `negative`.
    async fn classify(&self, text: &str) -> Result<String, ProviderError>;

    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// The inference API nests results one level deeper for batched input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            ClassificationResponse::Nested(outer) => outer.into_iter().next().unwrap_or_default(),
            ClassificationResponse::Flat(scores) => scores,
        }
    }
}

/// Hugging Face inference API text-classification client.
#[derive(Debug, Clone)]
pub struct HuggingFaceSentimentClient {
    client: Client,
    api_key: String,
    url: String,
}

impl HuggingFaceSentimentClient {
    pub fn new(config: &SentimentConfig, api_key: &str) -> Result<Self, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        Ok(Self {
            client: build_client(config.timeout_seconds)?,
            api_key: api_key.to_string(),
            url: format!(
                "{}/models/{}",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
        })
    }
}

#[async_trait]
impl SentimentClassifier for HuggingFaceSentimentClient {
    async fn classify(&self, text: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: ClassificationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        body.into_scores()
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|best| best.label.to_lowercase())
            .ok_or(ProviderError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> SentimentConfig {
        SentimentConfig {
            enabled: true,
            base_url,
            model: "sst-2".to_string(),
            api_key_env: "HF_API_TOKEN".to_string(),
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn test_classify_picks_highest_score() {
        let mock_server = MockServer::start().await;
        let client = HuggingFaceSentimentClient::new(&test_config(mock_server.uri()), "hf-token").unwrap();

        Mock::given(method("POST"))
            .and(path("/models/sst-2"))
            .and(header("authorization", "Bearer hf-token"))
            .and(body_json(serde_json::json!({ "inputs": "I feel awful today" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([[
                { "label": "POSITIVE", "score": 0.02 },
                { "label": "NEGATIVE", "score": 0.98 }
            ]])))
            .mount(&mock_server)
            .await;

        let label = client.classify("I feel awful today").await.unwrap();
        assert_eq!(label, "negative");
    }

    #[tokio::test]
    async fn test_classify_accepts_flat_list() {
        let mock_server = MockServer::start().await;
        let client = HuggingFaceSentimentClient::new(&test_config(mock_server.uri()), "t").unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "label": "POSITIVE", "score": 0.91 },
                { "label": "NEGATIVE", "score": 0.09 }
            ])))
            .mount(&mock_server)
            .await;

        assert_eq!(client.classify("great").await.unwrap(), "positive");
    }

    #[tokio::test]
    async fn test_classify_empty_result() {
        let mock_server = MockServer::start().await;
        let client = HuggingFaceSentimentClient::new(&test_config(mock_server.uri()), "t").unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([[]])))
            .mount(&mock_server)
            .await;

        assert!(matches!(
            client.classify("x").await,
            Err(ProviderError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_classify_malformed_body() {
        let mock_server = MockServer::start().await;
        let client = HuggingFaceSentimentClient::new(&test_config(mock_server.uri()), "t").unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"unexpected": true})))
            .mount(&mock_server)
            .await;

        assert!(matches!(
            client.classify("x").await,
            Err(ProviderError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_model_loading_error() {
        let mock_server = MockServer::start().await;
        let client = HuggingFaceSentimentClient::new(&test_config(mock_server.uri()), "t").unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": "Model sst-2 is currently loading"
            })))
            .mount(&mock_server)
            .await;

        match client.classify("x").await {
            Err(ProviderError::Api { code, message }) => {
                assert_eq!(code, 503);
                assert!(message.contains("loading"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_api_key_rejected() {
        assert!(matches!(
            HuggingFaceSentimentClient::new(&test_config("http://localhost".to_string()), ""),
            Err(ProviderError::MissingApiKey)
        ));
    }
}
