//! Newsletter subscriber repository

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

/// Newsletter repository
#[derive(Clone)]
pub struct NewsletterRepository {
    pool: PgPool,
}

impl NewsletterRepository {
    /// Create a new newsletter repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Subscribe an email address. Returns false when the address was
    /// already subscribed; re-subscribing is not an error.
    pub async fn subscribe(&self, email: &str) -> Result<bool> {
        info!("Newsletter signup: {}", email);

        let result = sqlx::query(
            r#"
            INSERT INTO newsletter_subscribers (email)
            VALUES ($1)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
