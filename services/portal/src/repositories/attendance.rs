//! Attendance repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{AttendanceRecord, AttendanceSummary, NewAttendance};

/// Attendance repository
#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    /// Create a new attendance repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an attendance mark for one class session. Marking the same
    /// session twice overwrites the earlier mark.
    pub async fn record(&self, new_attendance: &NewAttendance) -> Result<AttendanceRecord> {
        info!(
            "Recording attendance for enrollment {} on {}",
            new_attendance.enrollment_id, new_attendance.session_date
        );

        let row = sqlx::query(
            r#"
            INSERT INTO attendance (enrollment_id, session_date, present)
            VALUES ($1, $2, $3)
            ON CONFLICT (enrollment_id, session_date)
            DO UPDATE SET present = EXCLUDED.present
            RETURNING id, enrollment_id, session_date, present, created_at
            "#,
        )
        .bind(new_attendance.enrollment_id)
        .bind(new_attendance.session_date)
        .bind(new_attendance.present)
        .fetch_one(&self.pool)
        .await?;

        Ok(AttendanceRecord {
            id: row.get("id"),
            enrollment_id: row.get("enrollment_id"),
            session_date: row.get("session_date"),
            present: row.get("present"),
            created_at: row.get("created_at"),
        })
    }

    /// Attendance aggregated over one enrollment
    pub async fn summary(&self, enrollment_id: Uuid) -> Result<AttendanceSummary> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total_sessions,
                   COUNT(*) FILTER (WHERE present) AS attended
            FROM attendance
            WHERE enrollment_id = $1
            "#,
        )
        .bind(enrollment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(AttendanceSummary::from_counts(
            row.get("total_sessions"),
            row.get("attended"),
        ))
    }

    /// List attendance marks for one enrollment, newest session first
    pub async fn list_by_enrollment(&self, enrollment_id: Uuid) -> Result<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, enrollment_id, session_date, present, created_at
            FROM attendance
            WHERE enrollment_id = $1
            ORDER BY session_date DESC
            "#,
        )
        .bind(enrollment_id)
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(|row| AttendanceRecord {
                id: row.get("id"),
                enrollment_id: row.get("enrollment_id"),
                session_date: row.get("session_date"),
                present: row.get("present"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(records)
    }
}
