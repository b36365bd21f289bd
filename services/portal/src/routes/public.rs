//! Public routes: health, inquiry form, newsletter signup

use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::{PortalError, PortalResult};
use crate::middleware::client_ip;
use crate::models::{NewActivityLog, NewInquiry};
use crate::state::AppState;
use crate::throttle::ThrottleOptions;
use crate::validation;

/// Inquiry submissions per client: 3 per minute
const INQUIRY_LIMIT: ThrottleOptions = ThrottleOptions {
    max_requests: 3,
    window_ms: 60_000,
};

/// Newsletter signups per client: 5 per hour
const NEWSLETTER_LIMIT: ThrottleOptions = ThrottleOptions {
    max_requests: 5,
    window_ms: 3_600_000,
};

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "portal",
    }))
}

/// Submit an inquiry from the public site
pub async fn create_inquiry(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<NewInquiry>,
) -> PortalResult<impl IntoResponse> {
    let ip = client_ip(&headers, addr);
    let decision = state
        .throttle
        .check(&format!("inquiry:{ip}"), INQUIRY_LIMIT)
        .await;
    if !decision.allowed {
        return Err(PortalError::RateLimited {
            retry_after_ms: decision.retry_after_ms,
        });
    }

    validation::validate_name(&payload.name).map_err(PortalError::Validation)?;
    validation::validate_email(&payload.email).map_err(PortalError::Validation)?;
    validation::validate_message(&payload.message).map_err(PortalError::Validation)?;
    if let Some(phone) = &payload.phone {
        validation::validate_phone(phone).map_err(PortalError::Validation)?;
    }

    let inquiry = state
        .inquiry_repository
        .create(&payload)
        .await
        .map_err(|e| {
            error!("Failed to record inquiry: {}", e);
            PortalError::InternalServerError
        })?;

    // Notification delivery is handled outside the portal; this is where the
    // hook picks the inquiry up.
    info!("Inquiry {} ready for notification", inquiry.id);

    state
        .activity_repository
        .record_best_effort(&NewActivityLog::new(
            None,
            "inquiry.submitted",
            format!("inquiry {} from {}", inquiry.id, inquiry.email),
        ))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": inquiry.id,
            "message": "Thanks for reaching out. We will get back to you shortly.",
        })),
    ))
}

/// Request payload for newsletter signup
#[derive(Deserialize)]
pub struct NewsletterRequest {
    pub email: String,
}

/// Subscribe to the newsletter
pub async fn subscribe_newsletter(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<NewsletterRequest>,
) -> PortalResult<impl IntoResponse> {
    let ip = client_ip(&headers, addr);
    let decision = state
        .throttle
        .check(&format!("newsletter:{ip}"), NEWSLETTER_LIMIT)
        .await;
    if !decision.allowed {
        return Err(PortalError::RateLimited {
            retry_after_ms: decision.retry_after_ms,
        });
    }

    validation::validate_email(&payload.email).map_err(PortalError::Validation)?;

    let added = state
        .newsletter_repository
        .subscribe(&payload.email)
        .await
        .map_err(|e| {
            error!("Failed to record newsletter signup: {}", e);
            PortalError::InternalServerError
        })?;

    let message = if added {
        "You're on the list."
    } else {
        "You're already subscribed."
    };
    Ok(Json(json!({
        "message": message,
    })))
}
