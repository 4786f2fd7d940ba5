use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}

/// Create the log and booking tables if they are missing.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS behavioral_logs (
            id UUID PRIMARY KEY,
            seq BIGSERIAL,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            heart_rate INTEGER NOT NULL,
            breathing_rate INTEGER NOT NULL,
            anxiety_score INTEGER NOT NULL,
            cognitive_load INTEGER NOT NULL,
            status TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // seq orders timestamp ties; older tables predate the column
    sqlx::query("ALTER TABLE behavioral_logs ADD COLUMN IF NOT EXISTS seq BIGSERIAL")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS behavioral_logs_recent_idx ON behavioral_logs (timestamp DESC, seq DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expert_bookings (
            id UUID PRIMARY KEY,
            seq BIGSERIAL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            expert_name TEXT NOT NULL,
            consultation_date TEXT NOT NULL,
            user_name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("ALTER TABLE expert_bookings ADD COLUMN IF NOT EXISTS seq BIGSERIAL")
        .execute(pool)
        .await?;

    Ok(())
}
