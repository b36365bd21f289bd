//! Activity log repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing::warn;

use crate::models::{ActivityLog, NewActivityLog};

/// Activity log repository
#[derive(Clone)]
pub struct ActivityLogRepository {
    pool: PgPool,
}

impl ActivityLogRepository {
    /// Create a new activity log repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry to the activity log
    pub async fn record(&self, entry: &NewActivityLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (actor_id, action, detail)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(&entry.detail)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append an entry, logging instead of failing the caller's operation
    /// when the write does not go through.
    pub async fn record_best_effort(&self, entry: &NewActivityLog) {
        if let Err(e) = self.record(entry).await {
            warn!("Failed to record activity {}: {}", entry.action, e);
        }
    }

    /// Most recent activity entries
    pub async fn recent(&self, limit: i64) -> Result<Vec<ActivityLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, actor_id, action, detail, created_at
            FROM activity_logs
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| ActivityLog {
                id: row.get("id"),
                actor_id: row.get("actor_id"),
                action: row.get("action"),
                detail: row.get("detail"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(entries)
    }
}
