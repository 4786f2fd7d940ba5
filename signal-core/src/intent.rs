//! Deterministic intent matching.
//!
//! An `IntentTable` is an ordered list of keyword sets. A message is lowercased
//! and tested against each set top to bottom with plain substring containment,
//! so "heartbeat" matches "heart". The first set with any hit wins.

use serde::{Deserialize, Serialize};

const VITALS_KEYWORDS: &[&str] = &["scan", "measure", "pacer", "heart", "pulse"];
const STRESS_KEYWORDS: &[&str] = &["stress", "anxious", "panic"];
const SCHEDULING_KEYWORDS: &[&str] = &["doctor", "psychiatrist", "appointment", "booking"];
const PHARMACY_KEYWORDS: &[&str] = &["pharmacy", "medicine", "pill", "supplement"];

/// App action the client should perform alongside the reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    None,
    TriggerPacer,
    OpenExperts,
    OpenPharmacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Relief,
    Scheduling,
    Pharmacy,
}

impl Intent {
    pub fn action(self) -> Action {
        match self {
            Intent::Relief => Action::TriggerPacer,
            Intent::Scheduling => Action::OpenExperts,
            Intent::Pharmacy => Action::OpenPharmacy,
        }
    }

    pub fn agent_label(self) -> &'static str {
        match self {
            Intent::Relief => "Behavioral Agent",
            Intent::Scheduling => "Scheduler Agent",
            Intent::Pharmacy => "Pharmacy Agent",
        }
    }
}

/// Which keyword set triggers the relief pacer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntentProfile {
    /// Measurement wording: scan, measure, pacer, heart, pulse.
    #[default]
    Vitals,
    /// Stress wording: stress, anxious, panic.
    Stress,
}

#[derive(Debug, Clone)]
pub struct IntentRule {
    pub keywords: &'static [&'static str],
    pub intent: Intent,
}

impl IntentRule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

#[derive(Debug, Clone)]
pub struct IntentTable {
    rules: Vec<IntentRule>,
}

impl IntentTable {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    pub fn for_profile(profile: IntentProfile) -> Self {
        let relief = match profile {
            IntentProfile::Vitals => VITALS_KEYWORDS,
            IntentProfile::Stress => STRESS_KEYWORDS,
        };
        Self::new(vec![
            IntentRule {
                keywords: relief,
                intent: Intent::Relief,
            },
            IntentRule {
                keywords: SCHEDULING_KEYWORDS,
                intent: Intent::Scheduling,
            },
            IntentRule {
                keywords: PHARMACY_KEYWORDS,
                intent: Intent::Pharmacy,
            },
        ])
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Returns the first matching intent, or `None` to fall through to generation.
    pub fn match_message(&self, message: &str) -> Option<Intent> {
        let lowered = message.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.intent)
    }
}

impl Default for IntentTable {
    fn default() -> Self {
        Self::for_profile(IntentProfile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vitals_keywords_trigger_pacer() {
        let table = IntentTable::default();
        for msg in ["please scan me", "MEASURE now", "start the pacer", "my pulse is fast"] {
            let intent = table.match_message(msg);
            assert_eq!(intent, Some(Intent::Relief), "message: {}", msg);
            assert_eq!(intent.unwrap().action(), Action::TriggerPacer);
        }
    }

    #[test]
    fn test_substring_not_word_match() {
        let table = IntentTable::default();
        assert_eq!(table.match_message("my heartbeat feels off"), Some(Intent::Relief));
        assert_eq!(table.match_message("any good supplements?"), Some(Intent::Pharmacy));
    }

    #[test]
    fn test_priority_relief_beats_scheduling() {
        let table = IntentTable::default();
        assert_eq!(
            table.match_message("book a doctor to check my pulse"),
            Some(Intent::Relief)
        );
    }

    #[test]
    fn test_priority_scheduling_beats_pharmacy() {
        let table = IntentTable::default();
        let intent = table.match_message("ask the doctor about this medicine");
        assert_eq!(intent, Some(Intent::Scheduling));
        assert_eq!(intent.unwrap().action(), Action::OpenExperts);
    }

    #[test]
    fn test_pharmacy_keywords() {
        let table = IntentTable::default();
        let intent = table.match_message("Where is the nearest Pharmacy?");
        assert_eq!(intent, Some(Intent::Pharmacy));
        assert_eq!(intent.unwrap().action(), Action::OpenPharmacy);
        assert_eq!(intent.unwrap().agent_label(), "Pharmacy Agent");
    }

    #[test]
    fn test_no_match_falls_through() {
        let table = IntentTable::default();
        assert_eq!(table.match_message("what should I eat for dinner?"), None);
        assert_eq!(table.match_message(""), None);
    }

    #[test]
    fn test_stress_profile_swaps_relief_keywords() {
        let stress = IntentTable::for_profile(IntentProfile::Stress);
        assert_eq!(stress.match_message("I feel anxious"), Some(Intent::Relief));
        assert_eq!(stress.match_message("PANIC attack"), Some(Intent::Relief));
        // measurement wording no longer triggers the pacer
        assert_eq!(stress.match_message("scan my face"), None);

        let vitals = IntentTable::for_profile(IntentProfile::Vitals);
        assert_eq!(vitals.match_message("I feel anxious"), None);
    }

    #[test]
    fn test_custom_table_order_is_respected() {
        let table = IntentTable::new(vec![
            IntentRule {
                keywords: PHARMACY_KEYWORDS,
                intent: Intent::Pharmacy,
            },
            IntentRule {
                keywords: SCHEDULING_KEYWORDS,
                intent: Intent::Scheduling,
            },
        ]);
        assert_eq!(
            table.match_message("doctor, which medicine?"),
            Some(Intent::Pharmacy)
        );
        assert_eq!(table.rules().len(), 2);
    }

    #[test]
    fn test_action_serializes_snake_case() {
        assert_eq!(serde_json::to_value(Action::TriggerPacer).unwrap(), "trigger_pacer");
        assert_eq!(serde_json::to_value(Action::None).unwrap(), "none");
        assert_eq!(
            serde_json::from_value::<IntentProfile>(serde_json::json!("stress")).unwrap(),
            IntentProfile::Stress
        );
    }
}
