use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreate {
    pub expert_name: String,
    pub consultation_date: String,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookingRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expert_name: String,
    pub consultation_date: String,
    pub user_name: String,
}

impl BookingRecord {
    /// Build a record, filling `user_name` with `default_user_name` when the caller left it out.
    pub fn from_create(create: BookingCreate, default_user_name: &str) -> Self {
        let user_name = create
            .user_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| default_user_name.to_string());

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            expert_name: create.expert_name,
            consultation_date: create.consultation_date,
            user_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_name_filled() {
        let create: BookingCreate = serde_json::from_value(serde_json::json!({
            "expert_name": "Dr. Kavita Sharma",
            "consultation_date": "2026-10-17"
        }))
        .unwrap();
        let record = BookingRecord::from_create(create, "Guest");
        assert_eq!(record.user_name, "Guest");
        assert_eq!(record.expert_name, "Dr. Kavita Sharma");
        assert_eq!(record.consultation_date, "2026-10-17");
    }

    #[test]
    fn test_explicit_user_name_kept() {
        let create = BookingCreate {
            expert_name: "Dr. Rao".to_string(),
            consultation_date: "tomorrow".to_string(),
            user_name: Some("Mira".to_string()),
        };
        assert_eq!(BookingRecord::from_create(create, "Guest").user_name, "Mira");
    }

    #[test]
    fn test_blank_user_name_defaulted() {
        let create = BookingCreate {
            expert_name: "Dr. Rao".to_string(),
            consultation_date: "tomorrow".to_string(),
            user_name: Some("  ".to_string()),
        };
        assert_eq!(BookingRecord::from_create(create, "Guest").user_name, "Guest");
    }
}
