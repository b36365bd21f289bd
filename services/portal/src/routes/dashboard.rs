//! Student dashboard routes

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::error::{PortalError, PortalResult};
use crate::models::{AttendanceSummary, Enrollment, Role};
use crate::session::SessionUser;
use crate::state::AppState;

/// One enrollment with its attendance rollup
#[derive(Serialize)]
pub struct EnrollmentOverview {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub attendance: AttendanceSummary,
}

/// Response for the dashboard overview
#[derive(Serialize)]
pub struct DashboardResponse {
    pub user: SessionUser,
    pub enrollments: Vec<EnrollmentOverview>,
}

/// Dashboard overview: the student's enrollments, progress, and attendance
pub async fn overview(
    State(state): State<AppState>,
    jar: CookieJar,
) -> PortalResult<impl IntoResponse> {
    let user = state.sessions.require_user(&jar)?;

    let enrollments = state
        .enrollment_repository
        .list_by_user(user.id)
        .await
        .map_err(|e| {
            error!("Failed to load enrollments: {}", e);
            PortalError::InternalServerError
        })?;

    let mut overviews = Vec::with_capacity(enrollments.len());
    for enrollment in enrollments {
        let attendance = state
            .attendance_repository
            .summary(enrollment.id)
            .await
            .map_err(|e| {
                error!("Failed to load attendance summary: {}", e);
                PortalError::InternalServerError
            })?;
        overviews.push(EnrollmentOverview {
            enrollment,
            attendance,
        });
    }

    Ok(Json(DashboardResponse {
        user,
        enrollments: overviews,
    }))
}

/// Attendance history for one of the student's enrollments
pub async fn enrollment_attendance(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(enrollment_id): Path<Uuid>,
) -> PortalResult<impl IntoResponse> {
    let user = state.sessions.require_user(&jar)?;

    let enrollment = state
        .enrollment_repository
        .find_by_id(enrollment_id)
        .await
        .map_err(|e| {
            error!("Failed to load enrollment: {}", e);
            PortalError::InternalServerError
        })?
        .ok_or(PortalError::NotFound("Enrollment"))?;

    // Students can only see their own attendance
    if enrollment.user_id != user.id && user.role != Role::Admin {
        return Err(PortalError::Forbidden);
    }

    let records = state
        .attendance_repository
        .list_by_enrollment(enrollment.id)
        .await
        .map_err(|e| {
            error!("Failed to load attendance: {}", e);
            PortalError::InternalServerError
        })?;

    Ok(Json(records))
}
