use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form vitals sent alongside a chat message.
///
/// Clients send whatever they currently have (`{"hr": 72, "anxiety": 80}`, or
/// `"--"` for a reading that is not ready), so nothing here is validated.
/// Accessors accept both the short client keys and the long stored names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatVitals(Map<String, Value>);

impl ChatVitals {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First present value among `keys`, rendered as text. Numbers keep their
    /// JSON formatting; blank strings, `"--"`, nulls, arrays and objects count as missing.
    pub fn display(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find_map(render)
    }

    pub fn heart_rate(&self) -> Option<String> {
        self.display(&["hr", "heart_rate"])
    }

    pub fn breathing_rate(&self) -> Option<String> {
        self.display(&["br", "breathing_rate"])
    }

    pub fn anxiety(&self) -> Option<String> {
        self.display(&["anxiety", "anxiety_score"])
    }

    pub fn cognitive_load(&self) -> Option<String> {
        self.display(&["cognitive_load"])
    }

    pub fn status(&self) -> Option<String> {
        self.display(&["status"])
    }
}

impl From<Map<String, Value>> for ChatVitals {
    fn from(values: Map<String, Value>) -> Self {
        Self(values)
    }
}

/// Clients send this while a reading is still warming up.
const NOT_READY: &str = "--";

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && s != NOT_READY).then(|| s.to_string())
        }
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
