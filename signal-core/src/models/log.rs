use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed-shape vitals reading. On the wire heart and breathing rate are `hr` / `br`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VitalsSnapshot {
    #[serde(rename = "hr")]
    pub heart_rate: i32,
    #[serde(rename = "br")]
    pub breathing_rate: i32,
    pub anxiety_score: i32,
    pub cognitive_load: i32,
    pub status: String,
}

impl VitalsSnapshot {
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=100).contains(&self.anxiety_score) {
            return Err(format!(
                "anxiety_score must be between 0 and 100, got {}",
                self.anxiety_score
            ));
        }
        if self.heart_rate < 0 || self.breathing_rate < 0 || self.cognitive_load < 0 {
            return Err("hr, br and cognitive_load must not be negative".to_string());
        }
        Ok(())
    }
}

/// A stored vitals reading. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BehavioralLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub vitals: VitalsSnapshot,
}

impl BehavioralLogEntry {
    pub fn new(vitals: VitalsSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            vitals,
        }
    }
}
