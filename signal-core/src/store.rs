//! Persistence for vitals logs and expert bookings.
//!
//! Both record kinds are append-only. Retrieval is always "newest first,
//! capped at `limit`"; there is no update, delete or pagination.

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::error::SignalError;
use crate::models::{BehavioralLogEntry, BookingRecord, VitalsSnapshot};

#[async_trait]
pub trait VitalsStore: Send + Sync {
    async fn insert_log(&self, vitals: VitalsSnapshot) -> Result<BehavioralLogEntry, SignalError>;

    /// Most recent log entries, newest first.
    async fn recent_logs(&self, limit: u32) -> Result<Vec<BehavioralLogEntry>, SignalError>;

    async fn insert_booking(&self, record: BookingRecord) -> Result<BookingRecord, SignalError>;

    /// Most recent bookings, newest first.
    async fn recent_bookings(&self, limit: u32) -> Result<Vec<BookingRecord>, SignalError>;

    /// Short backend description for the health endpoint.
    async fn health(&self) -> Result<String, SignalError>;

    fn name(&self) -> &str;
}

// ============================================================================
// Postgres
// ============================================================================

pub struct PgVitalsStore {
    pool: PgPool,
}

impl PgVitalsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl VitalsStore for PgVitalsStore {
    async fn insert_log(&self, vitals: VitalsSnapshot) -> Result<BehavioralLogEntry, SignalError> {
        let entry = BehavioralLogEntry::new(vitals);
        let stored: BehavioralLogEntry = sqlx::query_as(
            r#"
            INSERT INTO behavioral_logs
                (id, timestamp, heart_rate, breathing_rate, anxiety_score, cognitive_load, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, timestamp, heart_rate, breathing_rate, anxiety_score, cognitive_load, status
            "#,
        )
        .bind(entry.id)
        .bind(entry.timestamp)
        .bind(entry.vitals.heart_rate)
        .bind(entry.vitals.breathing_rate)
        .bind(entry.vitals.anxiety_score)
        .bind(entry.vitals.cognitive_load)
        .bind(&entry.vitals.status)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id = %stored.id, "Stored behavioral log");
        Ok(stored)
    }

    async fn recent_logs(&self, limit: u32) -> Result<Vec<BehavioralLogEntry>, SignalError> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, timestamp, heart_rate, breathing_rate, anxiety_score, cognitive_load, status
            FROM behavioral_logs
            ORDER BY timestamp DESC, seq DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_booking(&self, record: BookingRecord) -> Result<BookingRecord, SignalError> {
        let stored: BookingRecord = sqlx::query_as(
            r#"
            INSERT INTO expert_bookings (id, created_at, expert_name, consultation_date, user_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at, expert_name, consultation_date, user_name
            "#,
        )
        .bind(record.id)
        .bind(record.created_at)
        .bind(&record.expert_name)
        .bind(&record.consultation_date)
        .bind(&record.user_name)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id = %stored.id, expert = %stored.expert_name, "Stored booking");
        Ok(stored)
    }

    async fn recent_bookings(&self, limit: u32) -> Result<Vec<BookingRecord>, SignalError> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, created_at, expert_name, consultation_date, user_name
            FROM expert_bookings
            ORDER BY created_at DESC, seq DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn health(&self) -> Result<String, SignalError> {
        Ok(crate::db::health_check(&self.pool).await?)
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local store used when no database URL is configured. Records are
/// lost on restart. Entries are kept in insertion order, so equal timestamps
/// resolve to the most recently inserted entry first.
#[derive(Default)]
pub struct MemoryVitalsStore {
    logs: RwLock<Vec<BehavioralLogEntry>>,
    bookings: RwLock<Vec<BookingRecord>>,
}

impl MemoryVitalsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VitalsStore for MemoryVitalsStore {
    async fn insert_log(&self, vitals: VitalsSnapshot) -> Result<BehavioralLogEntry, SignalError> {
        let entry = BehavioralLogEntry::new(vitals);
        self.logs.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn recent_logs(&self, limit: u32) -> Result<Vec<BehavioralLogEntry>, SignalError> {
        let logs = self.logs.read().await;
        Ok(logs.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn insert_booking(&self, record: BookingRecord) -> Result<BookingRecord, SignalError> {
        self.bookings.write().await.push(record.clone());
        Ok(record)
    }

    async fn recent_bookings(&self, limit: u32) -> Result<Vec<BookingRecord>, SignalError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn health(&self) -> Result<String, SignalError> {
        Ok("in-memory".to_string())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
