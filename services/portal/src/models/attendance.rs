//! Attendance model and related functionality

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single attendance mark for one class session
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub session_date: NaiveDate,
    pub present: bool,
    pub created_at: DateTime<Utc>,
}

/// New attendance mark payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttendance {
    pub enrollment_id: Uuid,
    pub session_date: NaiveDate,
    pub present: bool,
}

/// Attendance aggregated over one enrollment
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSummary {
    pub total_sessions: i64,
    pub attended: i64,
    pub rate: f64,
}

impl AttendanceSummary {
    /// Build a summary from raw counts; an enrollment with no sessions yet
    /// has a rate of 0.
    pub fn from_counts(total_sessions: i64, attended: i64) -> Self {
        let rate = if total_sessions > 0 {
            attended as f64 / total_sessions as f64
        } else {
            0.0
        };
        Self {
            total_sessions,
            attended,
            rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_computes_rate() {
        let summary = AttendanceSummary::from_counts(8, 6);
        assert_eq!(summary.total_sessions, 8);
        assert_eq!(summary.attended, 6);
        assert!((summary.rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_with_no_sessions_has_zero_rate() {
        let summary = AttendanceSummary::from_counts(0, 0);
        assert_eq!(summary.rate, 0.0);
    }
}
