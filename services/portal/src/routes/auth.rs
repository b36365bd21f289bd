//! Authentication routes: signup, login, logout, profile

use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::{PortalError, PortalResult};
use crate::middleware::client_ip;
use crate::models::{NewActivityLog, NewUser};
use crate::session::SessionUser;
use crate::state::AppState;
use crate::throttle::ThrottleOptions;
use crate::validation;

/// Signups per client: 3 per 10 minutes
const SIGNUP_LIMIT: ThrottleOptions = ThrottleOptions {
    max_requests: 3,
    window_ms: 600_000,
};

/// Login attempts per client: 5 per minute
const LOGIN_LIMIT: ThrottleOptions = ThrottleOptions {
    max_requests: 5,
    window_ms: 60_000,
};

/// Request payload for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request payload for a profile update
#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// User signup endpoint
pub async fn signup(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<NewUser>,
) -> PortalResult<impl IntoResponse> {
    let ip = client_ip(&headers, addr);
    let decision = state
        .throttle
        .check(&format!("signup:{ip}"), SIGNUP_LIMIT)
        .await;
    if !decision.allowed {
        return Err(PortalError::RateLimited {
            retry_after_ms: decision.retry_after_ms,
        });
    }

    validation::validate_name(&payload.name).map_err(PortalError::Validation)?;
    validation::validate_email(&payload.email).map_err(PortalError::Validation)?;
    validation::validate_password(&payload.password).map_err(PortalError::Validation)?;

    let existing = state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            PortalError::InternalServerError
        })?;
    if existing.is_some() {
        return Err(PortalError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let user = state.user_repository.create(&payload).await.map_err(|e| {
        error!("Failed to create user: {}", e);
        PortalError::InternalServerError
    })?;

    let identity = SessionUser::from(&user);
    let cookie = state.sessions.issue(&identity).map_err(|e| {
        error!("Failed to issue session: {}", e);
        PortalError::InternalServerError
    })?;

    state
        .activity_repository
        .record_best_effort(&NewActivityLog::new(
            Some(user.id),
            "user.signup",
            format!("new account for {}", user.email),
        ))
        .await;

    Ok((StatusCode::CREATED, jar.add(cookie), Json(identity)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> PortalResult<impl IntoResponse> {
    let ip = client_ip(&headers, addr);
    let decision = state
        .throttle
        .check(&format!("login:{ip}"), LOGIN_LIMIT)
        .await;
    if !decision.allowed {
        return Err(PortalError::RateLimited {
            retry_after_ms: decision.retry_after_ms,
        });
    }

    info!("Login attempt for: {}", payload.email);

    // A missing account and a wrong password both answer Unauthorized.
    let user = state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            PortalError::InternalServerError
        })?
        .ok_or(PortalError::Unauthorized)?;

    let password_ok = state
        .user_repository
        .verify_password(&user, &payload.password)
        .await
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            PortalError::InternalServerError
        })?;
    if !password_ok {
        return Err(PortalError::Unauthorized);
    }

    let identity = SessionUser::from(&user);
    let cookie = state.sessions.issue(&identity).map_err(|e| {
        error!("Failed to issue session: {}", e);
        PortalError::InternalServerError
    })?;

    state
        .activity_repository
        .record_best_effort(&NewActivityLog::new(
            Some(user.id),
            "user.login",
            format!("login from {}", ip),
        ))
        .await;

    Ok((jar.add(cookie), Json(identity)))
}

/// Logout endpoint. Idempotent: clearing an absent session is a no-op.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(state.sessions.clear_cookie()),
        Json(json!({"message": "Logged out successfully"})),
    )
}

/// Current session identity
pub async fn me(State(state): State<AppState>, jar: CookieJar) -> PortalResult<impl IntoResponse> {
    let user = state.sessions.require_user(&jar)?;
    Ok(Json(user))
}

/// Update the current user's display name and re-issue the session so the
/// cookie carries the new name.
pub async fn update_profile(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<UpdateProfileRequest>,
) -> PortalResult<impl IntoResponse> {
    let user = state.sessions.require_user(&jar)?;

    validation::validate_name(&payload.name).map_err(PortalError::Validation)?;

    let updated = state
        .user_repository
        .update_name(user.id, payload.name.trim())
        .await
        .map_err(|e| {
            error!("Failed to update profile: {}", e);
            PortalError::InternalServerError
        })?
        .ok_or(PortalError::NotFound("User"))?;

    let identity = SessionUser::from(&updated);
    let cookie = state.sessions.issue(&identity).map_err(|e| {
        error!("Failed to issue session: {}", e);
        PortalError::InternalServerError
    })?;

    state
        .activity_repository
        .record_best_effort(&NewActivityLog::new(
            Some(updated.id),
            "user.profile_updated",
            format!("renamed to {}", updated.name),
        ))
        .await;

    Ok((jar.add(cookie), Json(identity)))
}
