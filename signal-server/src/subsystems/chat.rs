//! Chat orchestrator — turns one `ChatRequest` into one `ChatResponse`.
//!
//! Two paths, no loops:
//! - a keyword intent matches: canned reply, no external calls;
//! - otherwise, when a generator is configured: sentiment (optional) → prompt →
//!   generation → speech (optional).
//!   If generation fails the caller still gets a 200-shaped offline reply.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use signal_core::config::ChatConfig;
use signal_core::models::{ChatRequest, ChatResponse, ChatVitals};
use signal_core::{
    Action, Intent, IntentTable, ResponseGenerator, SentimentClassifier, SpeechSynthesizer,
};

use crate::subsystems::providers::Collaborators;

pub const NEUTRAL_SENTIMENT: &str = "neutral";

/// Returned when the generative call fails or no generator is configured.
/// Provider error text is logged, never shown to the user.
pub const OFFLINE_MESSAGE: &str =
    "I am operating in offline mode. Please ask about 'scans' or 'doctors'.";

pub const SYSTEM_AGENT: &str = "System";
pub const GENERATIVE_AGENT: &str = "Gemini Health Mind";

/// User text beyond this many characters is cut before it goes into the prompt.
const MAX_MESSAGE_CHARS: usize = 2000;

pub struct ChatOrchestrator {
    intents: IntentTable,
    vitals_placeholder: String,
    generator: Option<Arc<dyn ResponseGenerator>>,
    sentiment: Option<Arc<dyn SentimentClassifier>>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl ChatOrchestrator {
    pub fn new(intents: IntentTable, vitals_placeholder: impl Into<String>) -> Self {
        Self {
            intents,
            vitals_placeholder: vitals_placeholder.into(),
            generator: None,
            sentiment: None,
            speech: None,
        }
    }

    pub fn from_config(config: &ChatConfig, collaborators: Collaborators) -> Self {
        Self {
            intents: IntentTable::for_profile(config.intent_profile),
            vitals_placeholder: config.vitals_placeholder.clone(),
            generator: collaborators.generator,
            sentiment: collaborators.sentiment,
            speech: collaborators.speech,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn ResponseGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_sentiment(mut self, sentiment: Arc<dyn SentimentClassifier>) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn model_name(&self) -> Option<&str> {
        self.generator.as_deref().map(|g| g.model_name())
    }

    pub fn has_sentiment(&self) -> bool {
        self.sentiment.is_some()
    }

    pub fn has_speech(&self) -> bool {
        self.speech.is_some()
    }

    pub async fn handle(&self, request: &ChatRequest) -> ChatResponse {
        if let Some(intent) = self.intents.match_message(&request.message) {
            tracing::debug!(intent = ?intent, "Deterministic intent matched");
            return canned_response(intent, &request.vitals);
        }

        let generator = match &self.generator {
            Some(g) => g,
            None => {
                tracing::debug!("No generative provider configured; replying offline");
                return offline_response(NEUTRAL_SENTIMENT.to_string());
            }
        };

        let sentiment = self.detect_sentiment(&request.message).await;
        let prompt = compose_prompt(
            &request.message,
            &request.vitals,
            &sentiment,
            &self.vitals_placeholder,
        );

        let text = match generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    model = generator.model_name(),
                    error = %e,
                    "Generation failed; replying offline"
                );
                return offline_response(sentiment);
            }
        };

        let audio = self.synthesize(&text).await;

        ChatResponse {
            agent: GENERATIVE_AGENT.to_string(),
            response: text,
            action: Action::None,
            sentiment: Some(sentiment),
            audio,
        }
    }

    async fn detect_sentiment(&self, message: &str) -> String {
        let classifier = match &self.sentiment {
            Some(c) => c,
            None => return NEUTRAL_SENTIMENT.to_string(),
        };

        match classifier.classify(message).await {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!(
                    provider = classifier.name(),
                    error = %e,
                    "Sentiment classification failed; using neutral"
                );
                NEUTRAL_SENTIMENT.to_string()
            }
        }
    }

    async fn synthesize(&self, text: &str) -> Option<String> {
        let speech = self.speech.as_ref()?;

        match speech.synthesize(text).await {
            Ok(audio) => Some(BASE64.encode(audio)),
            Err(e) => {
                tracing::warn!(
                    provider = speech.name(),
                    error = %e,
                    "Speech synthesis failed; replying without audio"
                );
                None
            }
        }
    }
}

fn canned_response(intent: Intent, vitals: &ChatVitals) -> ChatResponse {
    let response = match intent {
        Intent::Relief => format!(
            "I'm activating the Relief Pacer. Your anxiety is {}%. Align your face with the camera.",
            vitals.anxiety().unwrap_or_else(|| "0".to_string())
        ),
        Intent::Scheduling => {
            "I've connected to the Expert Nodes. A specialist has an opening tomorrow.".to_string()
        }
        Intent::Pharmacy => {
            "Opening the pharmacy. You can browse medicines and supplements there.".to_string()
        }
    };

    ChatResponse {
        agent: intent.agent_label().to_string(),
        response,
        action: intent.action(),
        sentiment: None,
        audio: None,
    }
}

fn offline_response(sentiment: String) -> ChatResponse {
    ChatResponse {
        agent: SYSTEM_AGENT.to_string(),
        response: OFFLINE_MESSAGE.to_string(),
        action: Action::None,
        sentiment: Some(sentiment),
        audio: None,
    }
}

/// Build the generation prompt. Vitals the client did not send are rendered
/// as `placeholder`.
pub fn compose_prompt(
    message: &str,
    vitals: &ChatVitals,
    sentiment: &str,
    placeholder: &str,
) -> String {
    let or_placeholder = |v: Option<String>| v.unwrap_or_else(|| placeholder.to_string());
    let message: String = message.trim().chars().take(MAX_MESSAGE_CHARS).collect();

    format!(
        "You are Silent Signal, an empathetic health AI.\n\
         User vitals: heart rate {} BPM, breathing rate {} breaths/min, anxiety {}%, \
         cognitive load {}, status {}.\n\
         Detected sentiment: {}.\n\
         User question: {}\n\
         Keep the answer brief (under 80 words), clinical, and supportive.",
        or_placeholder(vitals.heart_rate()),
        or_placeholder(vitals.breathing_rate()),
        or_placeholder(vitals.anxiety()),
        or_placeholder(vitals.cognitive_load()),
        or_placeholder(vitals.status()),
        sentiment,
        message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use signal_core::{IntentProfile, ProviderError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubGenerator {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ResponseGenerator for StubGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().ok_or(ProviderError::Api {
                code: 500,
                message: "upstream exploded: secret-key-123".to_string(),
            })
        }

        fn model_name(&self) -> &str {
            "stub-model"
        }
    }

    struct StubSentiment {
        label: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SentimentClassifier for StubSentiment {
        async fn classify(&self, _text: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.label
                .map(str::to_string)
                .ok_or(ProviderError::EmptyResponse)
        }

        fn name(&self) -> &str {
            "stub-sentiment"
        }
    }

    struct StubSpeech {
        ok: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechSynthesizer for StubSpeech {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.ok {
                Ok(b"mp3".to_vec())
            } else {
                Err(ProviderError::MissingApiKey)
            }
        }

        fn name(&self) -> &str {
            "stub-speech"
        }
    }

    fn request(message: &str, vitals: serde_json::Value) -> ChatRequest {
        serde_json::from_value(json!({ "message": message, "vitals": vitals })).unwrap()
    }

    fn generator(reply: Option<&str>) -> Arc<StubGenerator> {
        Arc::new(StubGenerator {
            reply: reply.map(str::to_string),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn sentiment(label: Option<&'static str>) -> Arc<StubSentiment> {
        Arc::new(StubSentiment {
            label,
            calls: AtomicUsize::new(0),
        })
    }

    fn speech(ok: bool) -> Arc<StubSpeech> {
        Arc::new(StubSpeech {
            ok,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_keyword_short_circuits_all_providers() {
        let gen = generator(Some("should not be used"));
        let sent = sentiment(Some("negative"));
        let tts = speech(true);
        let orchestrator = ChatOrchestrator::new(IntentTable::default(), "unknown")
            .with_generator(gen.clone())
            .with_sentiment(sent.clone())
            .with_speech(tts.clone());

        let resp = orchestrator
            .handle(&request("check my pulse and book a doctor", json!({"anxiety": 35})))
            .await;

        assert_eq!(resp.action, Action::TriggerPacer);
        assert_eq!(resp.agent, "Behavioral Agent");
        assert!(resp.response.contains("35%"));
        assert!(resp.sentiment.is_none());
        assert!(resp.audio.is_none());
        assert!(gen.prompts.lock().unwrap().is_empty());
        assert_eq!(sent.calls.load(Ordering::SeqCst), 0);
        assert_eq!(tts.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stress_profile_reproduces_anxiety_verbatim() {
        let orchestrator = ChatOrchestrator::new(IntentTable::for_profile(IntentProfile::Stress), "unknown");
        let resp = orchestrator
            .handle(&request("I feel anxious", json!({"hr": 72, "anxiety": 80})))
            .await;

        assert_eq!(resp.action, Action::TriggerPacer);
        assert!(resp.response.contains("80"), "got: {}", resp.response);
    }

    #[tokio::test]
    async fn test_relief_without_anxiety_defaults_to_zero() {
        let orchestrator = ChatOrchestrator::new(IntentTable::default(), "unknown");
        let resp = orchestrator.handle(&request("scan me", json!({}))).await;
        assert!(resp.response.contains("0%"));
    }

    #[tokio::test]
    async fn test_scheduling_and_pharmacy_actions() {
        let orchestrator = ChatOrchestrator::new(IntentTable::default(), "unknown");

        let resp = orchestrator.handle(&request("I need an appointment", json!({}))).await;
        assert_eq!(resp.action, Action::OpenExperts);
        assert_eq!(resp.agent, "Scheduler Agent");

        let resp = orchestrator.handle(&request("order my pills", json!({}))).await;
        assert_eq!(resp.action, Action::OpenPharmacy);

        let resp = orchestrator
            .handle(&request("booking for my medicine", json!({})))
            .await;
        assert_eq!(resp.action, Action::OpenExperts, "scheduling is checked before pharmacy");
    }

    #[tokio::test]
    async fn test_generative_success_with_sentiment_and_audio() {
        let gen = generator(Some("Try slow breathing for two minutes."));
        let tts = speech(true);
        let orchestrator = ChatOrchestrator::new(IntentTable::default(), "unknown")
            .with_generator(gen.clone())
            .with_sentiment(sentiment(Some("negative")))
            .with_speech(tts.clone());

        let resp = orchestrator
            .handle(&request("Why can't I sleep?", json!({"hr": 88, "anxiety": 61})))
            .await;

        assert_eq!(resp.agent, GENERATIVE_AGENT);
        assert_eq!(resp.action, Action::None);
        assert_eq!(resp.response, "Try slow breathing for two minutes.");
        assert_eq!(resp.sentiment.as_deref(), Some("negative"));
        assert_eq!(resp.audio.as_deref(), Some(BASE64.encode(b"mp3").as_str()));
        assert_eq!(tts.calls.load(Ordering::SeqCst), 1);

        let prompts = gen.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("heart rate 88 BPM"));
        assert!(prompts[0].contains("anxiety 61%"));
        assert!(prompts[0].contains("Detected sentiment: negative"));
        assert!(prompts[0].contains("Why can't I sleep?"));
    }

    #[tokio::test]
    async fn test_generation_failure_returns_generic_offline_reply() {
        let tts = speech(true);
        let orchestrator = ChatOrchestrator::new(IntentTable::default(), "unknown")
            .with_generator(generator(None))
            .with_speech(tts.clone());

        let resp = orchestrator.handle(&request("hello there", json!({}))).await;

        assert_eq!(resp.agent, SYSTEM_AGENT);
        assert_eq!(resp.action, Action::None);
        assert_eq!(resp.response, OFFLINE_MESSAGE);
        assert!(!resp.response.contains("secret-key-123"));
        assert!(resp.audio.is_none());
        assert_eq!(tts.calls.load(Ordering::SeqCst), 0, "no speech for the fallback");
    }

    #[tokio::test]
    async fn test_sentiment_failure_and_absence_are_neutral() {
        let failing = ChatOrchestrator::new(IntentTable::default(), "unknown")
            .with_generator(generator(Some("ok")))
            .with_sentiment(sentiment(None));
        let resp = failing.handle(&request("hello", json!({}))).await;
        assert_eq!(resp.sentiment.as_deref(), Some(NEUTRAL_SENTIMENT));
        assert_eq!(resp.agent, GENERATIVE_AGENT);

        let absent = ChatOrchestrator::new(IntentTable::default(), "unknown")
            .with_generator(generator(Some("ok")));
        let resp = absent.handle(&request("hello", json!({}))).await;
        assert_eq!(resp.sentiment.as_deref(), Some(NEUTRAL_SENTIMENT));
    }

    #[tokio::test]
    async fn test_speech_failure_omits_audio() {
        let orchestrator = ChatOrchestrator::new(IntentTable::default(), "unknown")
            .with_generator(generator(Some("fine")))
            .with_speech(speech(false));

        let resp = orchestrator.handle(&request("hello", json!({}))).await;
        assert_eq!(resp.response, "fine");
        assert!(resp.audio.is_none());
    }

    #[tokio::test]
    async fn test_no_generator_replies_offline() {
        let orchestrator = ChatOrchestrator::new(IntentTable::default(), "unknown");
        let resp = orchestrator.handle(&request("hello", json!({}))).await;
        assert_eq!(resp.agent, SYSTEM_AGENT);
        assert!(!resp.response.is_empty());
        assert!(orchestrator.model_name().is_none());
    }

    #[tokio::test]
    async fn test_no_generator_skips_sentiment_call() {
        let sent = sentiment(Some("negative"));
        let orchestrator =
            ChatOrchestrator::new(IntentTable::default(), "unknown").with_sentiment(sent.clone());

        let resp = orchestrator.handle(&request("hello", json!({}))).await;
        assert_eq!(resp.response, OFFLINE_MESSAGE);
        assert_eq!(resp.sentiment.as_deref(), Some(NEUTRAL_SENTIMENT));
        assert_eq!(sent.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_prompt_uses_placeholder_for_missing_vitals() {
        let vitals: ChatVitals = serde_json::from_value(json!({"hr": 70})).unwrap();
        let prompt = compose_prompt("how am I?", &vitals, "neutral", "n/a");
        assert!(prompt.contains("heart rate 70 BPM"));
        assert!(prompt.contains("breathing rate n/a"));
        assert!(prompt.contains("anxiety n/a%"));
        assert!(prompt.contains("status n/a"));
        assert!(prompt.contains("User question: how am I?"));
    }

    #[test]
    fn test_prompt_renders_not_ready_reading_as_placeholder() {
        let vitals: ChatVitals = serde_json::from_value(json!({"hr": "--", "br": 12})).unwrap();
        let prompt = compose_prompt("hi", &vitals, "neutral", "unknown");
        assert!(prompt.contains("heart rate unknown BPM"));
        assert!(prompt.contains("breathing rate 12 breaths/min"));
    }

    #[test]
    fn test_prompt_bounds_long_messages() {
        let long = "a".repeat(MAX_MESSAGE_CHARS + 500);
        let prompt = compose_prompt(&long, &ChatVitals::default(), "neutral", "unknown");
        assert!(prompt.contains(&"a".repeat(MAX_MESSAGE_CHARS)));
        assert!(!prompt.contains(&"a".repeat(MAX_MESSAGE_CHARS + 1)));
    }
}
