use serde::{Deserialize, Serialize};

use crate::intent::Action;
use crate::models::vitals::ChatVitals;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub vitals: ChatVitals,
}

/// One reply from the chat endpoint. `agent` names whoever produced the text:
/// a deterministic agent, the generative model, or `System` for the offline fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub agent: String,
    pub response: String,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    /// Base64-encoded audio of `response`, when speech synthesis succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}
