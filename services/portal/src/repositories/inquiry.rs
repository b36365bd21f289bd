//! Inquiry repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{Inquiry, InquiryStatus, InquiryStatusCount, NewInquiry};

/// Inquiry repository
#[derive(Clone)]
pub struct InquiryRepository {
    pool: PgPool,
}

impl InquiryRepository {
    /// Create a new inquiry repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a new inquiry with status `new`
    pub async fn create(&self, new_inquiry: &NewInquiry) -> Result<Inquiry> {
        info!("Recording inquiry from: {}", new_inquiry.email);

        let row = sqlx::query(
            r#"
            INSERT INTO inquiries (name, email, phone, course_interest, message, status)
            VALUES ($1, $2, $3, $4, $5, 'new')
            RETURNING id, name, email, phone, course_interest, message, status,
                      created_at, updated_at
            "#,
        )
        .bind(&new_inquiry.name)
        .bind(&new_inquiry.email)
        .bind(&new_inquiry.phone)
        .bind(&new_inquiry.course_interest)
        .bind(&new_inquiry.message)
        .fetch_one(&self.pool)
        .await?;

        inquiry_from_row(&row)
    }

    /// List inquiries, optionally filtered by status, newest first
    pub async fn list(
        &self,
        status: Option<InquiryStatus>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Inquiry>, i64)> {
        let offset = (page - 1) * limit;
        let status_filter = status.map(|s| s.as_str());

        let rows = sqlx::query(
            r#"
            SELECT id, name, email, phone, course_interest, message, status,
                   created_at, updated_at
            FROM inquiries
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status_filter)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM inquiries
            WHERE ($1::text IS NULL OR status = $1)
            "#,
        )
        .bind(status_filter)
        .fetch_one(&self.pool)
        .await?;
        let total: i64 = total_row.get("total");

        let inquiries = rows
            .iter()
            .map(inquiry_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok((inquiries, total))
    }

    /// Move an inquiry to a new triage status
    pub async fn update_status(&self, id: Uuid, status: InquiryStatus) -> Result<Option<Inquiry>> {
        info!("Updating inquiry {} to status {}", id, status.as_str());

        let row = sqlx::query(
            r#"
            UPDATE inquiries
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, phone, course_interest, message, status,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(inquiry_from_row).transpose()
    }

    /// Inquiry counts grouped by triage status, for the admin summary
    pub async fn counts_by_status(&self) -> Result<Vec<InquiryStatusCount>> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS count
            FROM inquiries
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let status: String = row.get("status");
                let status: InquiryStatus = status
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!("Invalid status in database: {}", e))?;
                Ok(InquiryStatusCount {
                    status,
                    count: row.get("count"),
                })
            })
            .collect()
    }
}

fn inquiry_from_row(row: &PgRow) -> Result<Inquiry> {
    let status: String = row.get("status");
    let status: InquiryStatus = status
        .parse()
        .map_err(|e: String| anyhow::anyhow!("Invalid status in database: {}", e))?;

    Ok(Inquiry {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        course_interest: row.get("course_interest"),
        message: row.get("message"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
