//! Admin panel routes: inquiry triage, student and enrollment management,
//! attendance entry, activity feed
//!
//! Every handler re-checks the admin role through the session manager; the
//! route guard's redirect is a convenience, not the authorization boundary.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::{PortalError, PortalResult};
use crate::models::{
    InquiryStatus, NewActivityLog, NewAttendance, NewEnrollment, UpdateEnrollment, User,
};
use crate::state::AppState;

/// Create the router for the admin panel
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inquiries", get(list_inquiries))
        .route("/inquiries/summary", get(inquiry_summary))
        .route("/inquiries/:id", patch(update_inquiry))
        .route("/students", get(list_students))
        .route("/enrollments", get(list_enrollments).post(create_enrollment))
        .route("/enrollments/:id", patch(update_enrollment))
        .route("/attendance", post(record_attendance))
        .route("/activity", get(list_activity))
}

/// Query parameters for the inquiry list
#[derive(Deserialize)]
pub struct InquiryListQuery {
    pub status: Option<InquiryStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Request payload for an inquiry status change
#[derive(Deserialize)]
pub struct UpdateInquiryRequest {
    pub status: InquiryStatus,
}

/// Query parameters for the activity feed
#[derive(Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

/// A student as shown in the admin panel
#[derive(Serialize)]
pub struct StudentSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

impl From<User> for StudentSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            joined_at: user.created_at,
        }
    }
}

/// List inquiries with optional status filter and paging
pub async fn list_inquiries(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<InquiryListQuery>,
) -> PortalResult<impl IntoResponse> {
    state.sessions.require_admin(&jar)?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (items, total) = state
        .inquiry_repository
        .list(query.status, page, limit)
        .await
        .map_err(|e| {
            error!("Failed to list inquiries: {}", e);
            PortalError::InternalServerError
        })?;

    Ok(Json(serde_json::json!({
        "items": items,
        "page": page,
        "limit": limit,
        "total": total,
    })))
}

/// Inquiry counts by triage status
pub async fn inquiry_summary(
    State(state): State<AppState>,
    jar: CookieJar,
) -> PortalResult<impl IntoResponse> {
    state.sessions.require_admin(&jar)?;

    let counts = state
        .inquiry_repository
        .counts_by_status()
        .await
        .map_err(|e| {
            error!("Failed to summarize inquiries: {}", e);
            PortalError::InternalServerError
        })?;

    Ok(Json(counts))
}

/// Move an inquiry to a new triage status
pub async fn update_inquiry(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInquiryRequest>,
) -> PortalResult<impl IntoResponse> {
    let admin = state.sessions.require_admin(&jar)?;

    let inquiry = state
        .inquiry_repository
        .update_status(id, payload.status)
        .await
        .map_err(|e| {
            error!("Failed to update inquiry: {}", e);
            PortalError::InternalServerError
        })?
        .ok_or(PortalError::NotFound("Inquiry"))?;

    state
        .activity_repository
        .record_best_effort(&NewActivityLog::new(
            Some(admin.id),
            "inquiry.status_changed",
            format!("inquiry {} -> {}", inquiry.id, inquiry.status.as_str()),
        ))
        .await;

    Ok(Json(inquiry))
}

/// List all students
pub async fn list_students(
    State(state): State<AppState>,
    jar: CookieJar,
) -> PortalResult<impl IntoResponse> {
    state.sessions.require_admin(&jar)?;

    let students = state.user_repository.list_students().await.map_err(|e| {
        error!("Failed to list students: {}", e);
        PortalError::InternalServerError
    })?;

    let students: Vec<StudentSummary> = students.into_iter().map(StudentSummary::from).collect();
    Ok(Json(students))
}

/// List all enrollments with student details
pub async fn list_enrollments(
    State(state): State<AppState>,
    jar: CookieJar,
) -> PortalResult<impl IntoResponse> {
    state.sessions.require_admin(&jar)?;

    let enrollments = state
        .enrollment_repository
        .list_with_students()
        .await
        .map_err(|e| {
            error!("Failed to list enrollments: {}", e);
            PortalError::InternalServerError
        })?;

    Ok(Json(enrollments))
}

/// Enroll a student in a course
pub async fn create_enrollment(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<NewEnrollment>,
) -> PortalResult<impl IntoResponse> {
    let admin = state.sessions.require_admin(&jar)?;

    let student = state
        .user_repository
        .find_by_id(payload.user_id)
        .await
        .map_err(|e| {
            error!("Failed to look up student: {}", e);
            PortalError::InternalServerError
        })?
        .ok_or(PortalError::NotFound("Student"))?;

    let enrollment = state
        .enrollment_repository
        .create(&payload)
        .await
        .map_err(|e| {
            error!("Failed to create enrollment: {}", e);
            PortalError::InternalServerError
        })?;

    state
        .activity_repository
        .record_best_effort(&NewActivityLog::new(
            Some(admin.id),
            "enrollment.created",
            format!("{} enrolled in {}", student.email, enrollment.course_slug),
        ))
        .await;

    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// Update an enrollment's status or progress
pub async fn update_enrollment(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEnrollment>,
) -> PortalResult<impl IntoResponse> {
    let admin = state.sessions.require_admin(&jar)?;

    if let Some(progress) = payload.progress_percent {
        if !(0..=100).contains(&progress) {
            return Err(PortalError::Validation(
                "Progress must be between 0 and 100".to_string(),
            ));
        }
    }

    let enrollment = state
        .enrollment_repository
        .update(id, &payload)
        .await
        .map_err(|e| {
            error!("Failed to update enrollment: {}", e);
            PortalError::InternalServerError
        })?
        .ok_or(PortalError::NotFound("Enrollment"))?;

    state
        .activity_repository
        .record_best_effort(&NewActivityLog::new(
            Some(admin.id),
            "enrollment.updated",
            format!(
                "enrollment {} now {} at {}%",
                enrollment.id,
                enrollment.status.as_str(),
                enrollment.progress_percent
            ),
        ))
        .await;

    Ok(Json(enrollment))
}

/// Record an attendance mark for a class session
pub async fn record_attendance(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<NewAttendance>,
) -> PortalResult<impl IntoResponse> {
    state.sessions.require_admin(&jar)?;

    state
        .enrollment_repository
        .find_by_id(payload.enrollment_id)
        .await
        .map_err(|e| {
            error!("Failed to look up enrollment: {}", e);
            PortalError::InternalServerError
        })?
        .ok_or(PortalError::NotFound("Enrollment"))?;

    let record = state
        .attendance_repository
        .record(&payload)
        .await
        .map_err(|e| {
            error!("Failed to record attendance: {}", e);
            PortalError::InternalServerError
        })?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Recent activity feed
pub async fn list_activity(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ActivityQuery>,
) -> PortalResult<impl IntoResponse> {
    state.sessions.require_admin(&jar)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let entries = state.activity_repository.recent(limit).await.map_err(|e| {
        error!("Failed to load activity log: {}", e);
        PortalError::InternalServerError
    })?;

    Ok(Json(entries))
}
