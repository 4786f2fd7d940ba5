use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::SignalError;
use crate::intent::IntentProfile;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SignalConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Postgres connection settings. Without a `url` the server keeps records in memory.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    /// Probed in order at startup; the first model that answers is kept.
    pub candidate_models: Vec<String>,
    /// Used unverified when every candidate fails the probe.
    pub fallback_model: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            candidate_models: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-pro".to_string(),
                "gemini-pro".to_string(),
            ],
            fallback_model: "gemini-pro".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SentimentConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api-inference.huggingface.co".to_string(),
            model: "distilbert-base-uncased-finetuned-sst-2-english".to_string(),
            api_key_env: "HF_API_TOKEN".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub base_url: String,
    pub voice_id: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.elevenlabs.io".to_string(),
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model: "eleven_multilingual_v2".to_string(),
            api_key_env: "ELEVENLABS_API_KEY".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub intent_profile: IntentProfile,
    /// Rendered in prompts in place of vitals the client did not send.
    pub vitals_placeholder: String,
    pub history_limit: u32,
    pub default_user_name: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            intent_profile: IntentProfile::Vitals,
            vitals_placeholder: "unknown".to_string(),
            history_limit: 7,
            default_user_name: "Guest".to_string(),
        }
    }
}

impl SignalConfig {
    /// Load from an optional TOML file, then apply `SIGNAL_<SECTION>__<KEY>` overrides.
    pub fn load(path: &str) -> Result<Self, SignalError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Self::environment())
            .build()?;
        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// `SIGNAL_<SECTION>__<KEY>` source. List keys take comma-separated values.
    fn environment() -> Environment {
        Environment::with_prefix("SIGNAL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("http.allowed_origins")
            .with_list_parse_key("generation.candidate_models")
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        if self.chat.history_limit == 0 {
            return Err(SignalError::InvalidConfig(
                "chat.history_limit must be at least 1".to_string(),
            ));
        }
        if self.generation.fallback_model.trim().is_empty() {
            return Err(SignalError::InvalidConfig(
                "generation.fallback_model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Read a provider credential from the environment; empty values count as absent.
    pub fn api_key(env_name: &str) -> Option<String> {
        std::env::var(env_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
