//! Enrollment model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Status of an enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Dropped => "dropped",
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EnrollmentStatus::Active),
            "completed" => Ok(EnrollmentStatus::Completed),
            "dropped" => Ok(EnrollmentStatus::Dropped),
            other => Err(format!("unknown enrollment status: {other}")),
        }
    }
}

/// Enrollment entity
#[derive(Debug, Clone, Serialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_slug: String,
    pub course_title: String,
    pub status: EnrollmentStatus,
    pub progress_percent: i32,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New enrollment creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewEnrollment {
    pub user_id: Uuid,
    pub course_slug: String,
    pub course_title: String,
}

/// Enrollment update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEnrollment {
    pub status: Option<EnrollmentStatus>,
    pub progress_percent: Option<i32>,
}

/// Enrollment joined with the student it belongs to, for the admin panel
#[derive(Debug, Clone, Serialize)]
pub struct AdminEnrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub course_slug: String,
    pub course_title: String,
    pub status: EnrollmentStatus,
    pub progress_percent: i32,
    pub enrolled_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            EnrollmentStatus::Active,
            EnrollmentStatus::Completed,
            EnrollmentStatus::Dropped,
        ] {
            assert_eq!(status.as_str().parse::<EnrollmentStatus>().unwrap(), status);
        }
        assert!("paused".parse::<EnrollmentStatus>().is_err());
    }
}
