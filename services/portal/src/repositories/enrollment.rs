//! Enrollment repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    AdminEnrollment, Enrollment, EnrollmentStatus, NewEnrollment, UpdateEnrollment,
};

/// Enrollment repository
#[derive(Clone)]
pub struct EnrollmentRepository {
    pool: PgPool,
}

impl EnrollmentRepository {
    /// Create a new enrollment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enroll a student in a course
    pub async fn create(&self, new_enrollment: &NewEnrollment) -> Result<Enrollment> {
        info!(
            "Enrolling user {} in course {}",
            new_enrollment.user_id, new_enrollment.course_slug
        );

        let row = sqlx::query(
            r#"
            INSERT INTO enrollments (user_id, course_slug, course_title, status, progress_percent)
            VALUES ($1, $2, $3, 'active', 0)
            RETURNING id, user_id, course_slug, course_title, status, progress_percent,
                      enrolled_at, updated_at
            "#,
        )
        .bind(new_enrollment.user_id)
        .bind(&new_enrollment.course_slug)
        .bind(&new_enrollment.course_title)
        .fetch_one(&self.pool)
        .await?;

        enrollment_from_row(&row)
    }

    /// List a student's enrollments, newest first
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Enrollment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, course_slug, course_title, status, progress_percent,
                   enrolled_at, updated_at
            FROM enrollments
            WHERE user_id = $1
            ORDER BY enrolled_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(enrollment_from_row).collect()
    }

    /// Find an enrollment by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Enrollment>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, course_slug, course_title, status, progress_percent,
                   enrolled_at, updated_at
            FROM enrollments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(enrollment_from_row).transpose()
    }

    /// List all enrollments joined with the student each belongs to, for the
    /// admin panel
    pub async fn list_with_students(&self) -> Result<Vec<AdminEnrollment>> {
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.user_id, u.name AS student_name, u.email AS student_email,
                   e.course_slug, e.course_title, e.status, e.progress_percent, e.enrolled_at
            FROM enrollments e
            JOIN users u ON u.id = e.user_id
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let status: String = row.get("status");
                let status: EnrollmentStatus = status
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!("Invalid status in database: {}", e))?;
                Ok(AdminEnrollment {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    student_name: row.get("student_name"),
                    student_email: row.get("student_email"),
                    course_slug: row.get("course_slug"),
                    course_title: row.get("course_title"),
                    status,
                    progress_percent: row.get("progress_percent"),
                    enrolled_at: row.get("enrolled_at"),
                })
            })
            .collect()
    }

    /// Update an enrollment's status and/or progress
    pub async fn update(&self, id: Uuid, update: &UpdateEnrollment) -> Result<Option<Enrollment>> {
        info!("Updating enrollment {}", id);

        let row = sqlx::query(
            r#"
            UPDATE enrollments
            SET status = COALESCE($2, status),
                progress_percent = COALESCE($3, progress_percent),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, course_slug, course_title, status, progress_percent,
                      enrolled_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.progress_percent)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(enrollment_from_row).transpose()
    }
}

fn enrollment_from_row(row: &PgRow) -> Result<Enrollment> {
    let status: String = row.get("status");
    let status: EnrollmentStatus = status
        .parse()
        .map_err(|e: String| anyhow::anyhow!("Invalid status in database: {}", e))?;

    Ok(Enrollment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        course_slug: row.get("course_slug"),
        course_title: row.get("course_title"),
        status,
        progress_percent: row.get("progress_percent"),
        enrolled_at: row.get("enrolled_at"),
        updated_at: row.get("updated_at"),
    })
}
